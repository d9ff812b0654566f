//! Read-only render pass: turns an index and a navigation state into view
//! models for the three panes.
//!
//! Views carry no styling. Every clickable entry lists the events a
//! presentation adapter should dispatch, in order, when it is chosen; the
//! adapter then renders again from the new state.

use crate::catalog::{
    CatalogIndex, EligibilityKind, ModuleCode, ModuleLink, ProgrammeCode, SimilarityKind,
};
use crate::navigation::{Event, NavigationState, module_subtitle};
use crate::query::{
    ModuleSearch, PROGRAMME_PAGE_SIZE, group_thousands, paginate, programme_caption,
    programme_matches, search_modules, search_programme_modules, stage_groups, stage_rows,
    summarize_modules,
};
use serde::Serialize;

/// Similarity lists show at most this many entries per category.
pub const SIMILAR_MODULES_SHOWN: usize = 5;

pub const NO_ELIGIBILITY: &str = "This module has no listed eligibility constraints.";
pub const NO_SIMILAR_MODULES: &str = "No similar modules listed.";
pub const NO_OTHER_PROGRAMMES: &str = "This module does not appear in any other majors.";

/// Two-line clickable entry.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Entry {
    pub title: String,
    /// Display subtitle; a single space when the source subtitle is blank.
    pub subtitle: String,
    pub events: Vec<Event>,
}

impl Entry {
    pub fn label(&self) -> String {
        format!("{}\n{}", self.title, self.subtitle)
    }
}

fn display_subtitle(subtitle: &str) -> String {
    if subtitle.trim().is_empty() {
        " ".to_string()
    } else {
        subtitle.to_string()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SidebarView {
    pub input_key: String,
    pub placeholder: String,
    pub caption: String,
    pub entries: Vec<Entry>,
    pub page: usize,
    pub total_pages: usize,
    pub show_prev: bool,
    pub show_next: bool,
}

/// Programme search pane: forced filter or query matches, one page at a time.
pub fn sidebar(index: &CatalogIndex, state: &NavigationState) -> SidebarView {
    let matches = programme_matches(
        index,
        &state.last_query,
        state.forced_programme_filter.as_ref(),
    );
    let page = paginate(&matches, PROGRAMME_PAGE_SIZE, state.page_number);
    let entries = page
        .items
        .iter()
        .map(|programme| Entry {
            title: programme.title.clone(),
            subtitle: display_subtitle(&programme.subtitle),
            events: vec![Event::SelectProgramme {
                code: programme.code.clone(),
                title: index
                    .programme_title(&programme.code)
                    .unwrap_or_default()
                    .to_string(),
                subtitle: Some(programme.subtitle.clone()),
            }],
        })
        .collect();
    let paged = page.total_pages > 1;
    SidebarView {
        input_key: state.input_key("prog_search_box"),
        placeholder: format!("Search all {} majors", group_thousands(index.programme_count())),
        caption: programme_caption(&page, PROGRAMME_PAGE_SIZE),
        entries,
        page: page.page,
        total_pages: page.total_pages,
        show_prev: paged && page.has_prev(),
        show_next: paged && page.has_next(),
    }
}

/// `PageNext` events that move the sidebar toward `page`, stopping at the last
/// page the current results have.
pub fn page_events(index: &CatalogIndex, state: &NavigationState, page: usize) -> Vec<Event> {
    let total_pages = sidebar(index, state).total_pages;
    let mut next = state.clone();
    let mut events = Vec::new();
    while next.page_number < page && next.can_page_next(total_pages) {
        next.page_number += 1;
        events.push(Event::PageNext);
    }
    events
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StageView {
    pub stage: i64,
    pub label: String,
    pub entries: Vec<Entry>,
    /// Entry index before which a core/option divider is drawn.
    pub divider_before: Option<usize>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ModuleListView {
    pub header: String,
    pub input_key: String,
    pub placeholder: String,
    pub caption: Option<String>,
    /// Selectable stages, ascending.
    pub stages: Vec<i64>,
    pub stage: Option<StageView>,
    pub message: Option<String>,
}

/// Module list pane.
///
/// With a programme selected it lists that programme's modules filtered by
/// `query`; otherwise it searches every link and shows nothing for a blank
/// query. `stage` picks the stage tab and falls back to the first one.
pub fn module_list(
    index: &CatalogIndex,
    state: &NavigationState,
    query: &str,
    stage: Option<i64>,
) -> ModuleListView {
    let (mut view, links, programme_mode) = match state.selected_programme() {
        Some(code) => {
            let view = ModuleListView {
                header: format!(
                    "{code} - {}",
                    state.programme.title.as_deref().unwrap_or_default()
                ),
                input_key: state.input_key("mod_search_box_major"),
                placeholder: format!("Search modules in {code}..."),
                caption: None,
                stages: Vec::new(),
                stage: None,
                message: None,
            };
            let links = search_programme_modules(index, code, query);
            if links.is_empty() {
                return ModuleListView {
                    message: Some("No modules found".to_string()),
                    ..view
                };
            }
            (view, links, true)
        }
        None => {
            let view = ModuleListView {
                header: "Module Search".to_string(),
                input_key: state.input_key("mod_search_box_global"),
                placeholder: format!(
                    "Search all {} modules",
                    group_thousands(index.module_count())
                ),
                caption: None,
                stages: Vec::new(),
                stage: None,
                message: None,
            };
            let links = match search_modules(index, query) {
                ModuleSearch::NoQuery => return view,
                ModuleSearch::Matches(links) if links.is_empty() => {
                    return ModuleListView {
                        message: Some("No matches found".to_string()),
                        ..view
                    };
                }
                ModuleSearch::Matches(links) => links,
            };
            (view, links, false)
        }
    };

    view.caption = Some(summarize_modules(&links).caption());
    view.stages = stage_groups(&links);
    let Some(first) = view.stages.first().copied() else {
        view.message = Some("No staged modules found".to_string());
        return view;
    };
    let selected = stage
        .filter(|stage| view.stages.contains(stage))
        .unwrap_or(first);
    let rows = stage_rows(&links, selected);
    view.stage = Some(StageView {
        stage: selected,
        label: format!("Stage {selected}"),
        entries: rows
            .rows
            .iter()
            .map(|link| module_entry(link, programme_mode))
            .collect(),
        divider_before: rows.divider_before,
    });
    view
}

fn module_entry(link: &ModuleLink, programme_mode: bool) -> Entry {
    let title = if link.title.is_empty() {
        link.module.0.clone()
    } else {
        link.title.clone()
    };
    Entry {
        title,
        subtitle: display_subtitle(&link.subtitle),
        events: vec![Event::SelectModule {
            code: link.module.clone(),
            programme: programme_mode.then(|| link.programme.clone()),
            title: Some(link.title.clone()),
            subtitle: Some(link.subtitle.clone()),
        }],
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SectionView {
    pub header: String,
    pub entries: Vec<Entry>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DetailsView {
    pub code: ModuleCode,
    pub header: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub eligibility: Vec<SectionView>,
    pub eligibility_message: Option<String>,
    pub similarity: Vec<SectionView>,
    pub similarity_message: Option<String>,
    pub other_programmes: Vec<Entry>,
    pub other_programmes_message: Option<String>,
}

/// Module details pane; `None` when no module is selected or the selected
/// code has no detail record.
pub fn details(index: &CatalogIndex, state: &NavigationState) -> Option<DetailsView> {
    let code = state.selected_module()?;
    let detail = index.module_detail(code)?;

    let eligibility: Vec<SectionView> = EligibilityKind::ALL
        .into_iter()
        .filter_map(|kind| related_section(index, kind.header(), &kind.modules(detail).codes))
        .collect();
    let similarity: Vec<SectionView> = SimilarityKind::ALL
        .into_iter()
        .filter_map(|kind| {
            let shown = kind.modules(detail).top(SIMILAR_MODULES_SHOWN);
            related_section(index, kind.header(), shown)
        })
        .collect();

    let current = state.selected_programme();
    let other_programmes: Vec<Entry> = index
        .programmes_for_module(&detail.code)
        .filter(|programme| Some(*programme) != current)
        .map(|programme| other_programme_entry(index, programme))
        .collect();

    let description = (!detail.description.trim().is_empty()).then(|| detail.description.clone());

    Some(DetailsView {
        code: detail.code.clone(),
        header: format!("{} - {}", detail.code, detail.title),
        subtitle: module_subtitle(state, index, detail),
        description,
        eligibility_message: eligibility.is_empty().then(|| NO_ELIGIBILITY.to_string()),
        eligibility,
        similarity_message: similarity.is_empty().then(|| NO_SIMILAR_MODULES.to_string()),
        similarity,
        other_programmes_message: other_programmes
            .is_empty()
            .then(|| NO_OTHER_PROGRAMMES.to_string()),
        other_programmes,
    })
}

fn related_section(
    index: &CatalogIndex,
    header: &str,
    codes: &[ModuleCode],
) -> Option<SectionView> {
    if codes.is_empty() {
        return None;
    }
    let entries = codes
        .iter()
        .map(|code| {
            let label = index.label_or_code(code);
            let subtitle = display_subtitle(&label.subtitle);
            Entry {
                events: vec![Event::SelectModule {
                    code: code.clone(),
                    programme: None,
                    title: Some(label.title.clone()),
                    subtitle: Some(subtitle.clone()),
                }],
                title: label.title,
                subtitle,
            }
        })
        .collect();
    Some(SectionView {
        header: header.to_string(),
        entries,
    })
}

fn other_programme_entry(index: &CatalogIndex, programme: &ProgrammeCode) -> Entry {
    let (title, subtitle) = match index.programme_summary(programme) {
        Some(summary) => (summary.title.clone(), display_subtitle(&summary.subtitle())),
        None => (String::new(), display_subtitle("")),
    };
    Entry {
        title: format!("{programme} - {title}"),
        subtitle: subtitle.clone(),
        events: vec![
            Event::SelectProgramme {
                code: programme.clone(),
                title,
                subtitle: Some(subtitle),
            },
            Event::ForceFilter {
                code: programme.clone(),
            },
        ],
    }
}

/// Adapter-owned inputs that are not part of the navigation state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewInputs {
    pub module_query: String,
    pub stage: Option<i64>,
}

/// All three panes from one state snapshot.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExplorerView {
    pub sidebar: SidebarView,
    pub modules: ModuleListView,
    pub details: Option<DetailsView>,
}

pub fn render(
    index: &CatalogIndex,
    state: &NavigationState,
    inputs: &ViewInputs,
) -> ExplorerView {
    ExplorerView {
        sidebar: sidebar(index, state),
        modules: module_list(index, state, &inputs.module_query, inputs.stage),
        details: details(index, state),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::model::{
        LINK_FIELDS, LINKS_TABLE, MODULE_DETAIL_FIELDS, MODULE_DETAILS_TABLE,
        PROGRAMME_META_TABLE, PROGRAMMES_TABLE,
    };
    use crate::catalog::{CatalogTables, Fingerprint, RecordSet};
    use serde_json::json;

    fn index() -> CatalogIndex {
        let tables = CatalogTables {
            programmes: RecordSet::from_value(
                PROGRAMMES_TABLE,
                json!([{"major_code": "A", "result_title": "A - Arts", "result_subtitle": "  ",
                        "search_blob": "arts"}]),
            )
            .unwrap(),
            programme_meta: RecordSet::from_value(
                PROGRAMME_META_TABLE,
                json!([{"major_code": "A", "programme_title": "Arts", "programme_level": "",
                        "programme_award": "", "programme_duration": "",
                        "programme_attendance": "", "programme_url": ""}]),
            )
            .unwrap(),
            links: RecordSet::new(LINKS_TABLE, LINK_FIELDS.iter().copied(), Vec::new()),
            module_details: RecordSet::new(
                MODULE_DETAILS_TABLE,
                MODULE_DETAIL_FIELDS.iter().copied(),
                Vec::new(),
            ),
        };
        CatalogIndex::build(&tables, Fingerprint::from("view")).unwrap()
    }

    #[test]
    fn blank_subtitles_render_as_a_space() {
        let sidebar = sidebar(&index(), &NavigationState::default());
        assert_eq!(sidebar.caption, "Showing 1 major");
        assert_eq!(sidebar.entries[0].label(), "A - Arts\n ");
        assert_eq!(
            sidebar.entries[0].events,
            vec![Event::SelectProgramme {
                code: "A".into(),
                title: "Arts".into(),
                subtitle: Some("  ".into()),
            }]
        );
        assert!(!sidebar.show_prev && !sidebar.show_next);
    }

    #[test]
    fn forced_filter_on_unknown_code_matches_nothing() {
        let state = NavigationState {
            forced_programme_filter: Some("ZZ".into()),
            ..NavigationState::default()
        };
        let sidebar = sidebar(&index(), &state);
        assert!(sidebar.entries.is_empty());
        assert_eq!(sidebar.caption, "No matches found");
    }

    #[test]
    fn page_events_stop_at_last_page() {
        let index = index();
        assert!(page_events(&index, &NavigationState::default(), 5).is_empty());

        let paged = NavigationState {
            page_number: 3,
            ..NavigationState::default()
        };
        assert!(page_events(&index, &paged, 1).is_empty());
    }

    #[test]
    fn input_keys_follow_reset_epoch() {
        let state = NavigationState {
            reset_epoch: 4,
            ..NavigationState::default()
        };
        let view = render(&index(), &state, &ViewInputs::default());
        assert_eq!(view.sidebar.input_key, "prog_search_box_4");
        assert_eq!(view.modules.input_key, "mod_search_box_global_4");
        assert!(view.details.is_none());
    }
}
