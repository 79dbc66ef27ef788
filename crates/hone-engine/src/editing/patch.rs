//! Surgical patching: splice dirty regions back into the original bytes.

use std::borrow::Cow;

use log::{debug, warn};

use crate::regions::Region;

/// Replaces the inner content of every dirty region in `original`.
///
/// Regions are applied from the highest offset downward so earlier offsets
/// stay valid while splicing. Bytes outside dirty regions are copied
/// unchanged. With nothing dirty the original is returned borrowed.
///
/// Regions must come from parsing exactly `original` and must not overlap.
pub fn patch<'a>(original: &'a str, regions: &[Region]) -> Cow<'a, str> {
    let mut dirty: Vec<(&Region, &str)> = regions
        .iter()
        .filter(|r| r.is_dirty)
        .filter_map(|r| r.current_content.as_deref().map(|content| (r, content)))
        .collect();
    if dirty.is_empty() {
        return Cow::Borrowed(original);
    }
    dirty.sort_by(|a, b| b.0.start_offset.cmp(&a.0.start_offset));

    let mut out = original.to_string();
    let mut applied = 0;
    for (region, content) in dirty {
        let range = region.start_offset..region.end_offset;
        if out.get(range.clone()).is_none() {
            warn!(
                "region {} offsets {}..{} do not fit the document, left unpatched",
                region.id, region.start_offset, region.end_offset
            );
            continue;
        }
        out.replace_range(range, content);
        applied += 1;
    }
    debug!("patched {applied} region(s)");
    Cow::Owned(out)
}
