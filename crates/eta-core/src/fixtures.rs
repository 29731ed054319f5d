//! Portal markup builders for tests.

/// One invoice row with ids, a date, a type and a total.
pub fn row(electronic: &str, internal: &str, total: &str) -> String {
    format!(
        r#"<div class="ms-DetailsRow" role="row">
             <div class="ms-DetailsRow-cell">
               <span class="internalId-link"><a>{electronic}</a></span>
               <span class="griCellSubTitle">{internal}</span>
             </div>
             <div class="ms-DetailsRow-cell"><span class="griCellTitleGray">01/01/2024</span></div>
             <div class="ms-DetailsRow-cell"><span class="griCellTitleGray">Invoice</span></div>
             <div class="ms-DetailsRow-cell"><span class="griCellTitleGray">{total}</span></div>
             <div class="ms-DetailsRow-cell"><span class="griCellTitleGray">Seller</span></div>
             <div class="ms-DetailsRow-cell"><span class="griCellTitleGray">Buyer</span></div>
             <div class="ms-DetailsRow-cell"></div>
             <div class="ms-DetailsRow-cell"><i class="status-Valid"></i></div>
           </div>"#
    )
}

/// A full list page with pagination chrome.
pub fn portal_page(rows: &[String], page: u32, total_count: usize, total_pages: u32) -> String {
    let mut controls = String::new();
    for n in 1..=total_pages.max(1) {
        let checked = if n == page { " is-checked" } else { "" };
        controls.push_str(&format!(
            r#"<button class="eta-pageNumber{checked}" aria-label="Page {n}" data-page="{n}">{n}</button>"#
        ));
    }
    let disabled = if page >= total_pages { " disabled" } else { "" };
    format!(
        r#"<html><body>
             <div class="eta-pagination">
               <span class="eta-pagination-totalrecordCount-label">Total records: {total_count}</span>
               {controls}
               <button aria-label="Next page"{disabled}>›</button>
             </div>
             <div class="ms-List">{}</div>
           </body></html>"#,
        rows.concat()
    )
}

/// A saved session of `total` records, `per_page` per page.
///
/// Electronic numbers are `E1`, `E2`, ... in list order; totals are
/// `100.00 EGP`.
pub fn session(total: usize, per_page: usize) -> Vec<String> {
    let pages = total.div_ceil(per_page).max(1) as u32;
    (1..=pages)
        .map(|page| {
            let start = (page as usize - 1) * per_page;
            let end = (start + per_page).min(total);
            let rows: Vec<String> = (start..end)
                .map(|i| row(&format!("E{}", i + 1), &format!("INV-{}", i + 1), "100.00 EGP"))
                .collect();
            portal_page(&rows, page, total, pages)
        })
        .collect()
}
