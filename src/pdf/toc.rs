use std::borrow::Cow;

use crate::plan::RenderPlan;
use crate::text::truncate;

use super::links::{LinkRegistry, LinkTarget};

/// Display titles longer than this are cut with an ellipsis.
pub const TOC_TITLE_LIMIT: usize = 60;

#[derive(Clone, Debug, PartialEq)]
pub struct TocEntry {
    pub title: String,
    /// 1 = document section, 2 = tag, 3 = endpoint.
    pub level: u8,
    pub target: LinkTarget,
    /// 1-based page the target landed on, known once layout has run.
    pub resolved_page: Option<usize>,
}

impl TocEntry {
    pub fn display_title(&self) -> Cow<'_, str> {
        truncate(&self.title, TOC_TITLE_LIMIT)
    }
}

/// Build the outline in rendering order, one pre-allocated target per entry.
pub fn plan_toc(plan: &RenderPlan<'_>, links: &mut LinkRegistry) -> Vec<TocEntry> {
    let mut entries = Vec::with_capacity(3 + plan.tags.len() + plan.endpoint_count());
    let mut push = |title: String, level: u8, links: &mut LinkRegistry| {
        entries.push(TocEntry {
            title,
            level,
            target: links.new_link(),
            resolved_page: None,
        });
    };

    push("Overview".to_string(), 1, links);
    if plan.has_servers() {
        push("Servers".to_string(), 1, links);
    }
    push("API Endpoints".to_string(), 1, links);
    for tag in &plan.tags {
        push(tag.name.clone(), 2, links);
        for ep in &tag.endpoints {
            push(ep.title(), 3, links);
        }
    }
    entries
}

/// Walks the TOC in render order, handing out each entry's target exactly once.
pub(super) struct TocCursor<'t> {
    entries: &'t [TocEntry],
    pos: usize,
}

impl<'t> TocCursor<'t> {
    pub(super) fn new(entries: &'t [TocEntry]) -> Self {
        TocCursor { entries, pos: 0 }
    }

    /// Consume the next entry; `title` must match what planning produced.
    pub(super) fn next(&mut self, title: &str) -> Option<LinkTarget> {
        let Some(entry) = self.entries.get(self.pos) else {
            log::error!("TOC exhausted before section {title:?}");
            return None;
        };
        if entry.title != title {
            log::error!(
                "TOC order mismatch at {}: planned {:?}, rendering {:?}",
                self.pos,
                entry.title,
                title
            );
            debug_assert_eq!(entry.title, title, "TOC order mismatch");
        }
        self.pos += 1;
        Some(entry.target)
    }

    /// Entries not yet consumed, in order.
    pub(super) fn upcoming(&self) -> &'t [TocEntry] {
        &self.entries[self.pos.min(self.entries.len())..]
    }

    pub(super) fn remaining(&self) -> usize {
        self.entries.len().saturating_sub(self.pos)
    }
}
