//! Registry key parsing.
//!
//! Keys look like `name[/instance][:type]`, e.g. `adapter-onebot:x8d3f` or
//! `group/ops:7a1c`. Only the part before the first `:` takes part in
//! by-name matching.

/// A registry key split into its parts. Borrows from the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentKey<'a> {
    /// Everything before the first `:` (the whole key when there is none).
    pub logical_name: &'a str,
    /// Part of the logical name after its first `/`.
    pub instance_suffix: Option<&'a str>,
    /// Everything after the first `:`.
    pub type_suffix: Option<&'a str>,
}

impl<'a> ComponentKey<'a> {
    pub fn parse(key: &'a str) -> Self {
        let (logical_name, type_suffix) = match key.split_once(':') {
            Some((name, ty)) => (name, Some(ty).filter(|t| !t.is_empty())),
            None => (key, None),
        };
        let instance_suffix = logical_name
            .split_once('/')
            .map(|(_, inst)| inst)
            .filter(|inst| !inst.is_empty());
        Self {
            logical_name,
            instance_suffix,
            type_suffix,
        }
    }

    pub fn matches_name(&self, name: &str) -> bool {
        self.logical_name == name
    }
}
