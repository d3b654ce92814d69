use crate::window::{LineStatus, RenderedLineId};

/// The page or window surface a widget is mounted on.
///
/// Element ids are the instance-scoped ids from
/// [`InstanceIds`](crate::theme::InstanceIds). Rendered lines are addressed by
/// their [`RenderedLineId`], which [`render_line`](crate::theme::render_line)
/// writes into the `data-line` attribute.
pub trait Host: Send + Sync {
    /// Whether an element with `id` exists
    fn has_element(&self, id: &str) -> bool;

    /// Add a stylesheet element with the given id
    fn inject_stylesheet(&self, id: &str, css: &str);

    /// Append `markup` inside the element `container_id`
    fn mount(&self, container_id: &str, markup: &str);

    /// Append a rendered lyric line at the end of `container_id`
    fn append_line(&self, container_id: &str, markup: &str);

    /// Add `class` to the element `id`
    fn add_class(&self, id: &str, class: &str);

    /// Replace the status class of a rendered line
    fn set_line_status(&self, line: RenderedLineId, status: LineStatus);

    /// Remove a rendered line from the page
    fn remove_line(&self, line: RenderedLineId);
}
