use super::Selections;
use crate::dom::{Dom, NodeId, ORIGINAL_SRC_ATTR};

/// The image a command should act on right now.
///
/// Undoing a text edit re-parses its region, which replaces the image node
/// an earlier command captured with an equal copy at the same place. The
/// copy is found again through the child-index path recorded when the
/// command was built.
fn live_image(dom: &Dom, image: NodeId, path: Option<&[usize]>) -> Option<NodeId> {
    if dom.is_attached(image) {
        return Some(image);
    }
    path.and_then(|path| dom.resolve_path(NodeId::ROOT, path))
        .filter(|&node| dom.element_name(node) == Some("img"))
}

/// Where a parent element lives now, following the same rule as
/// [`live_image`].
fn live_parent(dom: &Dom, parent: NodeId, path: Option<&[usize]>) -> NodeId {
    if dom.is_attached(parent) {
        return parent;
    }
    path.and_then(|path| dom.resolve_path(NodeId::ROOT, path))
        .filter(|&node| dom.element(node).is_some())
        .unwrap_or(parent)
}

/// Points an image at a new source.
///
/// Any original-source marker on the image is removed while the new
/// source is in effect, so the new `src` is what gets saved. Undo puts
/// both the old `src` and the marker back.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageReplace {
    pub image: NodeId,
    pub image_path: Option<Vec<usize>>,
    pub old_src: Option<String>,
    pub new_src: String,
    pub previous_marker: Option<String>,
    pub selections: Selections,
}

impl ImageReplace {
    pub fn new(dom: &Dom, image: NodeId, new_src: impl Into<String>) -> Self {
        Self {
            image,
            image_path: dom.path_from(NodeId::ROOT, image),
            old_src: dom.attribute(image, "src").map(str::to_string),
            new_src: new_src.into(),
            previous_marker: dom.attribute(image, ORIGINAL_SRC_ATTR).map(str::to_string),
            selections: Selections::default(),
        }
    }

    fn locate(&mut self, dom: &Dom) -> NodeId {
        if let Some(live) = live_image(dom, self.image, self.image_path.as_deref()) {
            self.image = live;
        }
        self.image
    }

    pub fn execute(&mut self, dom: &mut Dom) {
        let image = self.locate(dom);
        dom.set_attribute(image, "src", &self.new_src);
        if self.previous_marker.is_some() {
            dom.remove_attribute(image, ORIGINAL_SRC_ATTR);
        }
    }

    pub fn undo(&mut self, dom: &mut Dom) {
        let image = self.locate(dom);
        match &self.old_src {
            Some(src) => dom.set_attribute(image, "src", src),
            None => {
                dom.remove_attribute(image, "src");
            }
        }
        if let Some(marker) = &self.previous_marker {
            dom.set_attribute(image, ORIGINAL_SRC_ATTR, marker);
        }
    }

    pub fn redo(&mut self, dom: &mut Dom) {
        self.execute(dom);
    }
}

/// Inserts an image node. The node is removed on undo and put back on
/// redo.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInsert {
    pub image: NodeId,
    pub parent: NodeId,
    pub parent_path: Option<Vec<usize>>,
    pub index: usize,
    pub selections: Selections,
}

impl ImageInsert {
    pub fn new(dom: &Dom, image: NodeId, parent: NodeId, index: usize) -> Self {
        Self {
            image,
            parent,
            parent_path: dom.path_from(NodeId::ROOT, parent),
            index,
            selections: Selections::default(),
        }
    }

    fn image_path(&self) -> Option<Vec<usize>> {
        let mut path = self.parent_path.clone()?;
        path.push(self.index);
        Some(path)
    }

    pub fn execute(&mut self, dom: &mut Dom) {
        self.parent = live_parent(dom, self.parent, self.parent_path.as_deref());
        dom.insert_child(self.parent, self.index, self.image);
    }

    pub fn undo(&mut self, dom: &mut Dom) {
        if let Some(live) = live_image(dom, self.image, self.image_path().as_deref()) {
            self.image = live;
            dom.detach(live);
        }
    }

    pub fn redo(&mut self, dom: &mut Dom) {
        self.execute(dom);
    }
}

/// Removes an image node, remembering where it was.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageDelete {
    pub image: NodeId,
    pub parent: NodeId,
    pub parent_path: Option<Vec<usize>>,
    pub index: usize,
    pub selections: Selections,
}

impl ImageDelete {
    /// `None` when the image is not attached to anything.
    pub fn new(dom: &Dom, image: NodeId) -> Option<Self> {
        let parent = dom.parent(image)?;
        Some(Self {
            image,
            parent,
            parent_path: dom.path_from(NodeId::ROOT, parent),
            index: dom.index_in_parent(image)?,
            selections: Selections::default(),
        })
    }

    pub fn execute(&mut self, dom: &mut Dom) {
        let path = self.parent_path.clone().map(|mut path| {
            path.push(self.index);
            path
        });
        if let Some(live) = live_image(dom, self.image, path.as_deref()) {
            self.image = live;
            dom.detach(live);
        }
    }

    pub fn undo(&mut self, dom: &mut Dom) {
        self.parent = live_parent(dom, self.parent, self.parent_path.as_deref());
        dom.insert_child(self.parent, self.index, self.image);
    }

    pub fn redo(&mut self, dom: &mut Dom) {
        self.execute(dom);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn image(dom: &Dom) -> NodeId {
        dom.descendants(dom.root())
            .into_iter()
            .find(|&id| dom.element_name(id) == Some("img"))
            .unwrap()
    }

    #[test]
    fn replace_round_trips_src() {
        let src = "<p><img src=\"a.png\" alt=\"\"></p>";
        let mut dom = Dom::parse(src);
        let img = image(&dom);
        let mut cmd = ImageReplace::new(&dom, img, "b.png");
        cmd.execute(&mut dom);
        assert_eq!(dom.to_source(), "<p><img src=\"b.png\" alt=\"\"></p>");
        cmd.undo(&mut dom);
        assert_eq!(dom.to_source(), src);
    }

    #[test]
    fn replace_restores_original_src_marker() {
        let mut dom = Dom::parse("<p><img src=\"rel/a.png\"></p>");
        let img = image(&dom);
        dom.set_attribute(img, ORIGINAL_SRC_ATTR, "rel/a.png");
        dom.set_attribute(img, "src", "/abs/rel/a.png");

        let mut cmd = ImageReplace::new(&dom, img, "b.png");
        assert_eq!(cmd.previous_marker.as_deref(), Some("rel/a.png"));
        cmd.execute(&mut dom);
        assert_eq!(dom.attribute(img, ORIGINAL_SRC_ATTR), None);
        assert_eq!(dom.to_source(), "<p><img src=\"b.png\"></p>");

        cmd.undo(&mut dom);
        assert_eq!(dom.attribute(img, ORIGINAL_SRC_ATTR), Some("rel/a.png"));
        assert_eq!(dom.attribute(img, "src"), Some("/abs/rel/a.png"));
        assert_eq!(dom.to_source(), "<p><img src=\"rel/a.png\"></p>");
    }

    #[test]
    fn insert_and_delete_reuse_the_node() {
        let mut dom = Dom::parse("<p>a</p>");
        let p = dom.children(dom.root())[0];
        let img = dom.create_element("img", &[("src", "x.png")]);

        let mut insert = ImageInsert::new(&dom, img, p, 1);
        insert.execute(&mut dom);
        assert_eq!(dom.to_source(), "<p>a<img src=\"x.png\"></p>");

        let mut delete = ImageDelete::new(&dom, img).unwrap();
        delete.execute(&mut dom);
        assert_eq!(dom.to_source(), "<p>a</p>");
        delete.undo(&mut dom);
        assert_eq!(dom.children(p)[1], img);

        insert.undo(&mut dom);
        assert!(!dom.is_attached(img));
        insert.redo(&mut dom);
        assert_eq!(dom.children(p)[1], img);
    }

    #[test]
    fn insert_undo_finds_the_image_after_its_parent_is_reparsed() {
        let mut dom = Dom::parse("<div><p>a</p></div>");
        let div = dom.children(dom.root())[0];
        let p = dom.children(div)[0];
        let img = dom.create_element("img", &[("src", "x.png")]);
        let mut insert = ImageInsert::new(&dom, img, p, 0);
        insert.execute(&mut dom);

        dom.set_inner_html(div, "<p><img src=\"x.png\">a</p>");
        assert!(!dom.is_attached(img));

        insert.undo(&mut dom);
        assert_eq!(dom.to_source(), "<div><p>a</p></div>");
        insert.redo(&mut dom);
        assert_eq!(dom.to_source(), "<div><p><img src=\"x.png\">a</p></div>");
    }

    #[test]
    fn delete_and_replace_follow_a_reparsed_image() {
        let mut dom = Dom::parse("<p><img src=\"a.png\">t</p>");
        let p = dom.children(dom.root())[0];
        let img = image(&dom);
        let mut replace = ImageReplace::new(&dom, img, "b.png");
        replace.execute(&mut dom);
        let mut delete = ImageDelete::new(&dom, img).unwrap();
        delete.execute(&mut dom);
        assert_eq!(dom.to_source(), "<p>t</p>");

        dom.set_inner_html(p, "t");
        delete.undo(&mut dom);
        assert_eq!(dom.to_source(), "<p><img src=\"b.png\">t</p>");

        dom.set_inner_html(p, "<img src=\"b.png\">t");
        replace.undo(&mut dom);
        assert_eq!(dom.to_source(), "<p><img src=\"a.png\">t</p>");
    }
}
