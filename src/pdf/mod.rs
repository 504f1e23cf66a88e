//! PDF rendering with a table of contents and internal links.
//!
//! Every link target is allocated up front from the shared [`RenderPlan`](crate::plan::RenderPlan),
//! then the document is laid out twice: the first pass learns the page each
//! target lands on, the second prints those pages in the table of contents
//! and produces the bytes. Both passes consume targets in the same order.

mod layout;
pub mod links;
mod surface;
mod table;
pub mod toc;

use std::collections::HashMap;
use std::time::Instant;

use crate::config::PdfOptions;
use crate::error::Error;
use crate::fonts::FontSources;
use crate::model::Document;
use crate::plan::compute_render_plan;

use layout::Layout;
use links::{ComponentKey, LinkRegistry, LinkTarget};
use surface::{LayoutRecord, PageGeometry, Surface};
use toc::{TocEntry, plan_toc};

pub use surface::{Destination, PlacedLink};

/// Link target of one component schema inside one tag section.
#[derive(Clone, Debug, PartialEq)]
pub struct ComponentLink {
    pub key: ComponentKey,
    pub target: LinkTarget,
    /// 1-based page the component block starts on.
    pub page: Option<usize>,
}

/// A finished PDF together with what the layout did to produce it.
#[derive(Clone, Debug)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    pub toc: Vec<TocEntry>,
    pub page_count: usize,
    pub components: Vec<ComponentLink>,
    /// Every target bound to a page position, in binding order.
    pub bound_targets: Vec<LinkTarget>,
    pub destinations: HashMap<LinkTarget, Destination>,
    pub placed_links: Vec<PlacedLink>,
    /// Number of targets the registry handed out.
    pub allocated: usize,
    /// Lowest point drawn on any page, measured from the page top.
    pub max_content_y: f32,
    /// Content must stay above this y, measured from the page top.
    pub bottom_limit: f32,
}

impl RenderedPdf {
    /// 1-based page `target` was bound on.
    pub fn page_of(&self, target: LinkTarget) -> Option<usize> {
        self.destinations.get(&target).map(|d| d.page + 1)
    }
}

#[derive(Clone, Debug, Default)]
pub struct PdfConverter {
    options: PdfOptions,
}

impl PdfConverter {
    pub fn new(options: PdfOptions) -> Self {
        PdfConverter { options }
    }

    pub fn options(&self) -> &PdfOptions {
        &self.options
    }

    pub fn render(&self, doc: &Document) -> Result<RenderedPdf, Error> {
        let t0 = Instant::now();

        let geometry = PageGeometry::from_options(&self.options)?;
        let fonts = FontSources::load(self.options.font_family.as_deref(), &self.options.font_dirs);
        let t_fonts = t0.elapsed();

        let plan = compute_render_plan(doc);
        let mut links = LinkRegistry::new();
        let mut toc = plan_toc(&plan, &mut links);
        links.register_components(&plan);
        log::debug!(
            "plan: {} tags, {} endpoints, {} toc entries, {} link targets",
            plan.tags.len(),
            plan.endpoint_count(),
            toc.len(),
            links.allocated()
        );

        let first = Layout::new(&plan, &links, &toc, None, Surface::new(geometry, fonts.book()))
            .run()
            .record();
        let pass1_pages = page_numbers(&first);
        let t_pass1 = t0.elapsed();

        let (bytes, record) =
            Layout::new(&plan, &links, &toc, Some(&pass1_pages), Surface::new(geometry, fonts.book()))
                .run()
                .finish();
        let t_pass2 = t0.elapsed();

        let final_pages = page_numbers(&record);
        let moved = final_pages
            .iter()
            .filter(|&(target, page)| pass1_pages.get(target) != Some(page))
            .count();
        if moved > 0 || first.page_count != record.page_count {
            log::warn!(
                "TOC page numbers did not settle: {moved} targets moved between passes ({} -> {} pages)",
                first.page_count,
                record.page_count
            );
        }

        for entry in &mut toc {
            entry.resolved_page = final_pages.get(&entry.target).copied();
        }
        let components = links
            .components()
            .map(|(key, target)| ComponentLink {
                key: key.clone(),
                target,
                page: final_pages.get(&target).copied(),
            })
            .collect();

        log::info!(
            "PDF timing: fonts={:.1}ms, pass1={:.1}ms, pass2+assembly={:.1}ms ({} pages, {} bytes)",
            t_fonts.as_secs_f64() * 1000.0,
            (t_pass1 - t_fonts).as_secs_f64() * 1000.0,
            (t_pass2 - t_pass1).as_secs_f64() * 1000.0,
            record.page_count,
            bytes.len(),
        );

        Ok(RenderedPdf {
            bytes,
            toc,
            page_count: record.page_count,
            components,
            bound_targets: record.bind_order,
            destinations: record.destinations,
            placed_links: record.placed_links,
            allocated: links.allocated(),
            max_content_y: record.deepest_y,
            bottom_limit: geometry.bottom_limit(),
        })
    }
}

fn page_numbers(record: &LayoutRecord) -> HashMap<LinkTarget, usize> {
    record
        .destinations
        .iter()
        .map(|(&target, dest)| (target, dest.page + 1))
        .collect()
}
