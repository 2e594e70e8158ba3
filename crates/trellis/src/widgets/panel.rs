/// Model of a plain container.
///
/// A panel has no content of its own; its children and its skin decide what
/// it looks like.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Panel;

impl Panel {
    pub fn new() -> Self {
        Self
    }
}
