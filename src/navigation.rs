//! Session navigation state and the events that advance it.
//!
//! `transition` is a pure function of `(state, event, index)`; nothing else
//! mutates a `NavigationState`. `Session` pairs one state value with the shared
//! index cache and is the only place a hard reset reaches the cache.

use crate::catalog::{
    CatalogIndex, CatalogLoader, IndexCache, ModuleCode, ModuleDetail, ProgrammeCode,
};
use crate::error::CatalogError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// A selected programme or module: code plus the display strings chosen with it.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Selection<C> {
    pub code: Option<C>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
}

impl<C> Selection<C> {
    pub fn is_empty(&self) -> bool {
        self.code.is_none() && self.title.is_none() && self.subtitle.is_none()
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct NavigationState {
    pub programme: Selection<ProgrammeCode>,
    pub module: Selection<ModuleCode>,
    pub page_number: usize,
    pub last_query: String,
    pub forced_programme_filter: Option<ProgrammeCode>,
    /// Bumped by every reset so adapters can give input widgets a fresh identity.
    pub reset_epoch: u64,
}

impl NavigationState {
    /// Selected programme code, ignoring blank codes.
    pub fn selected_programme(&self) -> Option<&ProgrammeCode> {
        self.programme.code.as_ref().filter(|code| !code.is_blank())
    }

    /// Selected module code, ignoring blank codes.
    pub fn selected_module(&self) -> Option<&ModuleCode> {
        self.module.code.as_ref().filter(|code| !code.is_blank())
    }

    pub fn can_page_prev(&self) -> bool {
        self.page_number > 0
    }

    pub fn can_page_next(&self, total_pages: usize) -> bool {
        self.page_number + 1 < total_pages
    }

    /// Identity for an adapter-owned input, e.g. `prog_search_box_3`.
    pub fn input_key(&self, name: &str) -> String {
        format!("{name}_{}", self.reset_epoch)
    }
}

/// User interactions, as emitted by a presentation adapter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    SelectProgramme {
        code: ProgrammeCode,
        title: String,
        subtitle: Option<String>,
    },
    SelectModule {
        code: ModuleCode,
        programme: Option<ProgrammeCode>,
        title: Option<String>,
        subtitle: Option<String>,
    },
    QueryChanged {
        query: String,
    },
    PageNext,
    PagePrev,
    ForceFilter {
        code: ProgrammeCode,
    },
    Reset {
        #[serde(default)]
        hard: bool,
    },
}

/// Apply one event to a state, returning the next state.
pub fn transition(
    state: &NavigationState,
    event: &Event,
    index: &CatalogIndex,
) -> NavigationState {
    advance(state, event, |code| index.programme_title(code).map(str::to_string))
}

/// Whether applying `event` consults the index.
fn reads_index(event: &Event) -> bool {
    matches!(
        event,
        Event::SelectModule { programme: Some(code), .. } if !code.is_blank()
    )
}

fn advance(
    state: &NavigationState,
    event: &Event,
    programme_title: impl Fn(&ProgrammeCode) -> Option<String>,
) -> NavigationState {
    let mut next = state.clone();
    match event {
        Event::SelectProgramme {
            code,
            title,
            subtitle,
        } => {
            // Any programme click lifts a forced filter; "other majors" entries
            // re-apply it with a ForceFilter right after.
            next.forced_programme_filter = None;
            if next.programme.code.as_ref() == Some(code) {
                return next;
            }
            next.programme = Selection {
                code: Some(code.clone()),
                title: Some(title.clone()),
                subtitle: subtitle.clone(),
            };
            next.module = Selection::default();
        }
        Event::SelectModule {
            code,
            programme,
            title,
            subtitle,
        } => {
            if next.module.code.as_ref() != Some(code) {
                next.module.code = Some(code.clone());
            }
            if let Some(title) = title {
                next.module.title = Some(title.clone());
            }
            if let Some(subtitle) = subtitle {
                next.module.subtitle = Some(subtitle.clone());
            }
            if let Some(programme) = programme.as_ref().filter(|code| !code.is_blank()) {
                next.programme.code = Some(programme.clone());
                if let Some(title) = programme_title(programme) {
                    next.programme.title = Some(title);
                }
            }
        }
        Event::QueryChanged { query } => {
            if *query != next.last_query {
                next.page_number = 0;
                next.last_query = query.clone();
                next.forced_programme_filter = None;
            }
        }
        Event::PageNext => next.page_number = next.page_number.saturating_add(1),
        Event::PagePrev => next.page_number = next.page_number.saturating_sub(1),
        Event::ForceFilter { code } => {
            next.forced_programme_filter = Some(code.clone());
            next.page_number = 0;
            next.module = Selection::default();
        }
        Event::Reset { .. } => {
            next = NavigationState {
                reset_epoch: state.reset_epoch + 1,
                ..NavigationState::default()
            };
        }
    }
    next
}

/// Subtitle built from module details when none was chosen with the selection.
///
/// Parts, in order and skipping blanks: the selected programme code (only when
/// that programme really contains the module), the capitalized module type, the
/// coordinator, the trimester, and the credit label.
pub fn synthesize_subtitle(
    state: &NavigationState,
    index: &CatalogIndex,
    detail: &ModuleDetail,
) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    if let Some(programme) = state.selected_programme() {
        if index.module_in_programme(&detail.code, programme) {
            parts.push(programme.as_str().trim().to_string());
        }
    }
    parts.push(detail.module_type.capitalized());
    parts.push(detail.coordinator.clone());
    parts.push(detail.trimester.clone());
    if let Some(credits) = &detail.credits {
        parts.push(credits.label());
    }

    let parts: Vec<&str> = parts
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect();
    (!parts.is_empty()).then(|| parts.join(" - "))
}

/// Subtitle for the details header: the stored one when non-blank, else synthesized.
pub fn module_subtitle(
    state: &NavigationState,
    index: &CatalogIndex,
    detail: &ModuleDetail,
) -> Option<String> {
    match state.module.subtitle.as_deref() {
        Some(subtitle) if !subtitle.trim().is_empty() => Some(subtitle.to_string()),
        _ => synthesize_subtitle(state, index, detail),
    }
}

/// One user's navigation state bound to a shared index cache.
pub struct Session<L> {
    cache: Arc<IndexCache>,
    loader: L,
    state: NavigationState,
}

impl<L: CatalogLoader> Session<L> {
    pub fn new(cache: Arc<IndexCache>, loader: L) -> Self {
        Self {
            cache,
            loader,
            state: NavigationState::default(),
        }
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    /// Current index, rebuilt only when the loader's fingerprint changed.
    pub fn index(&self) -> Result<Arc<CatalogIndex>, CatalogError> {
        self.cache.get_or_build(&self.loader)
    }

    /// Run one transition. A hard reset also invalidates the shared index cache.
    ///
    /// Only events that look up programme titles touch the loader, so paging,
    /// queries and resets still apply while the catalog source is unavailable.
    pub fn dispatch(&mut self, event: &Event) -> Result<(), CatalogError> {
        self.state = if reads_index(event) {
            let index = self.index()?;
            transition(&self.state, event, &index)
        } else {
            advance(&self.state, event, |_| None)
        };
        if let Event::Reset { hard: true } = event {
            self.cache.invalidate();
        }
        debug!(?event, epoch = self.state.reset_epoch, "dispatched navigation event");
        Ok(())
    }

    /// Dispatch events in order, stopping at the first failure.
    pub fn dispatch_all<'e>(
        &mut self,
        events: impl IntoIterator<Item = &'e Event>,
    ) -> Result<(), CatalogError> {
        for event in events {
            self.dispatch(event)?;
        }
        Ok(())
    }
}
