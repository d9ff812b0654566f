//! Substring search, pagination and count formatting over a `CatalogIndex`.
//!
//! Search text is lowercased once when the index is built, so every query here
//! only normalizes the query itself and runs a plain substring test. Results
//! borrow from the index and keep source order.

use crate::catalog::{
    CatalogIndex, ModuleLink, ModuleType, ProgrammeCode, ProgrammeResult, UNSTAGED,
};
use std::collections::BTreeSet;

/// Programme results shown per sidebar page.
pub const PROGRAMME_PAGE_SIZE: usize = 10;

/// Trim and lowercase a query.
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Programmes whose search text contains the normalized query; all programmes
/// for an empty query.
pub fn search_programmes<'a>(index: &'a CatalogIndex, query: &str) -> Vec<&'a ProgrammeResult> {
    let needle = normalize_query(query);
    if needle.is_empty() {
        return index.programmes().iter().collect();
    }
    index
        .programmes()
        .iter()
        .filter(|programme| {
            index
                .programme_search_text(&programme.code)
                .is_some_and(|text| text.contains(&needle))
        })
        .collect()
}

/// Sidebar result set: a forced programme filter wins over the query.
pub fn programme_matches<'a>(
    index: &'a CatalogIndex,
    query: &str,
    forced: Option<&ProgrammeCode>,
) -> Vec<&'a ProgrammeResult> {
    match forced {
        Some(code) => index
            .programmes()
            .iter()
            .filter(|programme| &programme.code == code)
            .collect(),
        None => search_programmes(index, query),
    }
}

/// Outcome of a catalog-wide module search.
#[derive(Debug, PartialEq)]
pub enum ModuleSearch<'a> {
    /// The query was blank; callers show nothing rather than everything.
    NoQuery,
    Matches(Vec<&'a ModuleLink>),
}

/// Links across all programmes whose search text contains the lowercased query.
///
/// Blankness is judged on the trimmed query, but matching uses the query as
/// typed (lowercased only), so surrounding spaces still take part.
pub fn search_modules<'a>(index: &'a CatalogIndex, query: &str) -> ModuleSearch<'a> {
    if query.trim().is_empty() {
        return ModuleSearch::NoQuery;
    }
    let needle = query.to_lowercase();
    ModuleSearch::Matches(
        index
            .links()
            .iter()
            .filter(|link| link.search_text.contains(&needle))
            .collect(),
    )
}

/// Links of one programme matching the normalized query; the full set for an empty query.
pub fn search_programme_modules<'a>(
    index: &'a CatalogIndex,
    programme: &ProgrammeCode,
    query: &str,
) -> Vec<&'a ModuleLink> {
    let needle = normalize_query(query);
    index
        .programme_links(programme)
        .iter()
        .filter(|link| needle.is_empty() || link.search_text.contains(&needle))
        .collect()
}

/// One page of a result list.
#[derive(Debug, PartialEq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    /// Page actually served, after clamping.
    pub page: usize,
    pub total_pages: usize,
    pub total: usize,
    /// Index of the first item on the page.
    pub start: usize,
    /// One past the last item on the page.
    pub end: usize,
}

impl<T> Page<'_, T> {
    pub fn has_prev(&self) -> bool {
        self.page > 0
    }

    pub fn has_next(&self) -> bool {
        self.page + 1 < self.total_pages
    }
}

/// `max(1, ceil(count / page_size))`.
pub fn total_pages(count: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 1;
    }
    count.div_ceil(page_size).max(1)
}

/// Slice `[page * page_size, page * page_size + page_size)`, clamping `page`
/// into `[0, total_pages - 1]`.
pub fn paginate<T>(items: &[T], page_size: usize, page: usize) -> Page<'_, T> {
    let total = items.len();
    let total_pages = total_pages(total, page_size);
    let page = page.min(total_pages - 1);
    let start = page.saturating_mul(page_size).min(total);
    let end = start.saturating_add(page_size).min(total);
    Page {
        items: &items[start..end],
        page,
        total_pages,
        total,
        start,
        end,
    }
}

/// Sidebar caption for a page of programme results.
pub fn programme_caption<T>(page: &Page<'_, T>, page_size: usize) -> String {
    match page.total {
        0 => "No matches found".to_string(),
        1 => "Showing 1 major".to_string(),
        n if n <= page_size => format!("Showing {n} majors"),
        n => format!("Showing {}..{} of {n} majors", page.start + 1, page.end),
    }
}

/// `"1 module"`, `"2 modules"`, `"1,500 majors"`.
pub fn plural(n: usize, singular: &str) -> String {
    plural_with(n, singular, None)
}

/// Like [`plural`], with an explicit irregular plural form.
pub fn plural_with(n: usize, singular: &str, plural: Option<&str>) -> String {
    if n == 1 {
        return format!("1 {singular}");
    }
    match plural {
        Some(plural) => format!("{} {plural}", group_thousands(n)),
        None => format!("{} {singular}s", group_thousands(n)),
    }
}

/// Decimal digits with `,` every three places.
pub fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Distinct staged values among the links, ascending; unstaged rows are left out.
pub fn stage_groups(links: &[&ModuleLink]) -> Vec<i64> {
    links
        .iter()
        .map(|link| link.sort_stage)
        .filter(|stage| *stage != UNSTAGED)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Rows of one stage, in order, with the position of the core/option divider.
#[derive(Debug, PartialEq)]
pub struct StageRows<'a> {
    pub stage: i64,
    pub rows: Vec<&'a ModuleLink>,
    /// Index of the first option row that follows at least one core row.
    pub divider_before: Option<usize>,
}

pub fn stage_rows<'a>(links: &[&'a ModuleLink], stage: i64) -> StageRows<'a> {
    let rows: Vec<&ModuleLink> = links
        .iter()
        .copied()
        .filter(|link| link.sort_stage == stage)
        .collect();
    let mut seen_core = false;
    let mut divider_before = None;
    for (idx, link) in rows.iter().enumerate() {
        match link.module_type {
            ModuleType::Optional if seen_core && divider_before.is_none() => {
                divider_before = Some(idx);
            }
            ModuleType::Core => seen_core = true,
            _ => {}
        }
    }
    StageRows {
        stage,
        rows,
        divider_before,
    }
}

/// Distinct counts behind a module list caption.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ModuleSummary {
    pub modules: usize,
    pub stages: usize,
    pub programmes: usize,
}

impl ModuleSummary {
    /// `"Showing 3 modules in 2 stages from 1 major"`.
    pub fn caption(&self) -> String {
        format!(
            "Showing {} in {} from {}",
            plural(self.modules, "module"),
            plural(self.stages, "stage"),
            plural(self.programmes, "major")
        )
    }
}

/// Count distinct modules, numeric `module_stage` values and programmes.
pub fn summarize_modules(links: &[&ModuleLink]) -> ModuleSummary {
    let modules: BTreeSet<_> = links.iter().map(|link| &link.module).collect();
    let stages: BTreeSet<_> = links.iter().filter_map(|link| link.stage_number).collect();
    let programmes: BTreeSet<_> = links
        .iter()
        .map(|link| link.programme.as_str().trim().to_lowercase())
        .filter(|code| !code.is_empty())
        .collect();
    ModuleSummary {
        modules: modules.len(),
        stages: stages.len(),
        programmes: programmes.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ModuleCode;

    fn link(module: &str, stage: i64, module_type: &str) -> ModuleLink {
        ModuleLink {
            programme: ProgrammeCode::from("P1"),
            module: ModuleCode::from(module),
            stage: stage.to_string(),
            stage_number: (stage != UNSTAGED).then_some(stage),
            module_type: ModuleType::parse(module_type),
            level: String::new(),
            title: module.to_string(),
            subtitle: String::new(),
            search_text: module.to_lowercase(),
            sort_stage: stage,
            sort_type: None,
            sort_level: None,
        }
    }

    #[test]
    fn pagination_splits_twenty_three_items() {
        let items: Vec<usize> = (0..23).collect();
        let first = paginate(&items, 10, 0);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.items, &items[0..10]);
        assert!(!first.has_prev());
        assert!(first.has_next());

        let last = paginate(&items, 10, 2);
        assert_eq!(last.items, &items[20..23]);
        assert!(last.has_prev());
        assert!(!last.has_next());
    }

    #[test]
    fn pagination_clamps_out_of_range_pages() {
        let items: Vec<usize> = (0..5).collect();
        let page = paginate(&items, 10, 7);
        assert_eq!(page.page, 0);
        assert_eq!(page.items.len(), 5);

        let empty: Vec<usize> = Vec::new();
        let page = paginate(&empty, 10, 3);
        assert_eq!(page.total_pages, 1);
        assert!(page.items.is_empty());
        assert_eq!((page.start, page.end), (0, 0));
    }

    #[test]
    fn plural_examples() {
        assert_eq!(plural(1, "module"), "1 module");
        assert_eq!(plural(2, "module"), "2 modules");
        assert_eq!(plural(0, "stage"), "0 stages");
        assert_eq!(plural(1500, "major"), "1,500 majors");
        assert_eq!(plural_with(3, "child", Some("children")), "3 children");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
        assert_eq!(group_thousands(999), "999");
    }

    #[test]
    fn programme_captions_follow_page_shape() {
        let items: Vec<usize> = (0..23).collect();
        let caption =
            |count: usize, page: usize| programme_caption(&paginate(&items[..count], 10, page), 10);
        assert_eq!(caption(23, 1), "Showing 11..20 of 23 majors");
        assert_eq!(caption(1, 0), "Showing 1 major");
        assert_eq!(caption(4, 0), "Showing 4 majors");
        assert_eq!(caption(0, 0), "No matches found");
    }

    #[test]
    fn stage_rows_place_divider_after_core() {
        let links = vec![
            link("A", 1, "core"),
            link("B", 2, "core"),
            link("C", 1, "option"),
            link("D", 1, "option"),
            link("E", UNSTAGED, "core"),
        ];
        let refs: Vec<&ModuleLink> = links.iter().collect();
        assert_eq!(stage_groups(&refs), vec![1, 2]);

        let stage_one = stage_rows(&refs, 1);
        let codes: Vec<&str> = stage_one.rows.iter().map(|l| l.module.as_str()).collect();
        assert_eq!(codes, vec!["A", "C", "D"]);
        assert_eq!(stage_one.divider_before, Some(1));

        let options_only = stage_rows(&refs[2..4], 1);
        assert_eq!(options_only.divider_before, None);
    }

    #[test]
    fn summary_counts_distinct_values() {
        let links = vec![link("A", 1, "core"), link("A", 1, "core"), link("B", 2, "option")];
        let refs: Vec<&ModuleLink> = links.iter().collect();
        let summary = summarize_modules(&refs);
        assert_eq!(
            summary,
            ModuleSummary {
                modules: 2,
                stages: 2,
                programmes: 1
            }
        );
        assert_eq!(summary.caption(), "Showing 2 modules in 2 stages from 1 major");
    }
}
