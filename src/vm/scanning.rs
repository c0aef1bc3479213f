use crate::root_enumerator::FrameRoot;

/// Callback trait of frame-scanning functions that report roots.
///
/// [`crate::scan_frame`] decodes a whole oop map before it calls the visitor, so a visitor
/// never sees part of a root set: either every root of the frame is reported, or the scan fails
/// and none is.
pub trait RootVisitor {
    /// Call this function for each root.
    fn visit_root(&mut self, root: FrameRoot);
}

/// This lets us use closures as RootVisitor.
impl<F: FnMut(FrameRoot)> RootVisitor for F {
    fn visit_root(&mut self, root: FrameRoot) {
        self(root)
    }
}
