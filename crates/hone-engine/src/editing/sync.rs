//! Region synchronization: read live region content back into [`Region`]s.

use std::collections::HashMap;

use log::trace;

use crate::dom::{Dom, NodeId, REGION_ID_ATTR};
use crate::regions::Region;

/// Attached elements carrying a region id, keyed by that id. The first
/// element in document order wins.
pub(crate) fn region_elements(dom: &Dom) -> HashMap<String, NodeId> {
    let mut found = HashMap::new();
    for node in dom.descendants(dom.root()) {
        if let Some(id) = dom.attribute(node, REGION_ID_ATTR) {
            found.entry(id.to_string()).or_insert(node);
        }
    }
    found
}

/// Updates `current_content` and `is_dirty` for every region whose element
/// is still on the live surface. Regions without one are left as they are.
pub fn sync(dom: &Dom, regions: &mut [Region]) {
    let elements = region_elements(dom);
    for region in regions.iter_mut() {
        let Some(&node) = elements.get(&region.id) else {
            trace!("no live element for {}", region.id);
            continue;
        };
        let current = dom.inner_html(node);
        region.is_dirty = current != region.original_content;
        region.current_content = Some(current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::inject::inject;
    use crate::regions::collect_regions;

    #[test]
    fn marks_only_changed_regions_dirty() {
        let src = "<p>one</p><p>two</p>";
        let mut dom = Dom::parse(src);
        let mut regions = collect_regions(&dom, src);
        inject(&mut dom, &regions);

        let second = dom.find_by_attribute(REGION_ID_ATTR, "region-1").unwrap();
        dom.set_inner_html(second, "2");
        sync(&dom, &mut regions);

        assert!(!regions[0].is_dirty);
        assert_eq!(regions[0].current_content.as_deref(), Some("one"));
        assert!(regions[1].is_dirty);
        assert_eq!(regions[1].current_content.as_deref(), Some("2"));
    }

    #[test]
    fn missing_element_leaves_region_untouched() {
        let src = "<ul><li>a</li></ul>";
        let mut dom = Dom::parse(src);
        let mut regions = collect_regions(&dom, src);
        inject(&mut dom, &regions);

        let li = dom.find_by_attribute(REGION_ID_ATTR, "region-0").unwrap();
        dom.detach(li);
        sync(&dom, &mut regions);

        assert_eq!(regions[0].current_content, None);
        assert!(!regions[0].is_dirty);
    }
}
