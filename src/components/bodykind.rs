use bevy_ecs::prelude::Component;

/// Classification of a body, fixed when the body is created.
///
/// The component is immutable: once inserted it can only be read, so a body
/// created as [`BodyKind::Static`] reports `Static` until it is destroyed.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[component(immutable)]
pub enum BodyKind {
    /// Never moves; acts as a rigid platform.
    Static,
    /// Reacts to gravity and contact impulses.
    Dynamic,
}

impl BodyKind {
    pub fn is_dynamic(self) -> bool {
        self == BodyKind::Dynamic
    }

    pub fn name(self) -> &'static str {
        match self {
            BodyKind::Static => "static",
            BodyKind::Dynamic => "dynamic",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_dynamic_is_dynamic() {
        assert!(BodyKind::Dynamic.is_dynamic());
        assert!(!BodyKind::Static.is_dynamic());
    }

    #[test]
    fn names() {
        assert_eq!(BodyKind::Static.name(), "static");
        assert_eq!(BodyKind::Dynamic.name(), "dynamic");
    }
}
