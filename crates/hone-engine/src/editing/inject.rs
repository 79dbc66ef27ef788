//! Marks live elements as editable regions.

use log::warn;

use crate::dom::{Dom, EDITABLE_ATTR, REGION_ID_ATTR};
use crate::regions::Region;

/// Marks each region's element with its id and makes it editable.
///
/// Elements are found by the element-only path recorded at parse time and
/// must carry the region's tag. Returns the ids that could not be placed.
pub fn inject(dom: &mut Dom, regions: &[Region]) -> Vec<String> {
    let mut missing = Vec::new();
    for region in regions {
        let node = dom
            .resolve_element_path(dom.root(), &region.element_path)
            .filter(|&node| dom.element_name(node) == Some(region.tag_name.as_str()));
        match node {
            Some(node) => {
                dom.set_mark(node, REGION_ID_ATTR, &region.id);
                dom.set_mark(node, EDITABLE_ATTR, "true");
            }
            None => {
                warn!("could not place {} (<{}>)", region.id, region.tag_name);
                missing.push(region.id.clone());
            }
        }
    }
    missing
}

/// Removes every region mark from the live surface.
pub fn clear_injection(dom: &mut Dom) {
    dom.clear_marks(REGION_ID_ATTR);
    dom.clear_marks(EDITABLE_ATTR);
}
