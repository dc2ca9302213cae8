/// Base layers are mutually exclusive backgrounds; overlays toggle freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Base,
    Overlay,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerEntry {
    pub name: String,
    pub kind: LayerKind,
    pub visible: bool,
}

/// Visibility state behind the layer-toggle panel.
#[derive(Debug, Clone, Default)]
pub struct LayerControl {
    entries: Vec<LayerEntry>,
}

impl LayerControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a layer and returns its index. The first base layer starts
    /// visible, later ones hidden; overlays start visible.
    pub fn add(&mut self, name: impl Into<String>, kind: LayerKind) -> usize {
        let visible = match kind {
            LayerKind::Base => !self.entries.iter().any(|e| e.kind == LayerKind::Base),
            LayerKind::Overlay => true,
        };
        self.entries.push(LayerEntry {
            name: name.into(),
            kind,
            visible,
        });
        self.entries.len() - 1
    }

    pub fn entries(&self) -> &[LayerEntry] {
        &self.entries
    }

    pub fn is_visible(&self, index: usize) -> bool {
        self.entries.get(index).is_some_and(|e| e.visible)
    }

    /// Showing a base layer hides every other base layer. A base layer is
    /// only hidden by showing another one, so hiding it directly is ignored.
    pub fn set_visible(&mut self, index: usize, visible: bool) {
        let Some(kind) = self.entries.get(index).map(|e| e.kind) else {
            return;
        };
        if kind == LayerKind::Base {
            if !visible {
                return;
            }
            for entry in self.entries.iter_mut().filter(|e| e.kind == LayerKind::Base) {
                entry.visible = false;
            }
        }
        self.entries[index].visible = visible;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn control() -> LayerControl {
        let mut control = LayerControl::new();
        control.add("Street Map", LayerKind::Base);
        control.add("Earthquakes", LayerKind::Overlay);
        control.add("Tectonic Plates", LayerKind::Overlay);
        control.add("Topographic", LayerKind::Base);
        control
    }

    #[test]
    fn defaults() {
        let control = control();
        let visible = control
            .entries()
            .iter()
            .map(|e| (e.name.as_str(), e.visible))
            .collect::<Vec<_>>();
        assert_eq!(
            visible,
            vec![
                ("Street Map", true),
                ("Earthquakes", true),
                ("Tectonic Plates", true),
                ("Topographic", false),
            ]
        );
    }

    #[test]
    fn base_layers_are_exclusive() {
        let mut control = control();
        let topo = 3;
        control.set_visible(topo, true);
        assert!(control.is_visible(topo));
        assert!(!control.is_visible(0));
        // Overlays are untouched.
        assert!(control.is_visible(1));
    }

    #[test]
    fn overlays_toggle_independently() {
        let mut control = control();
        control.set_visible(1, false);
        assert!(!control.is_visible(1));
        assert!(control.is_visible(2));
        control.set_visible(1, true);
        assert!(control.is_visible(1));
    }

    #[test]
    fn unknown_index_is_ignored() {
        let mut control = control();
        control.set_visible(99, true);
        assert!(!control.is_visible(99));
    }

    fn visible_bases(control: &LayerControl) -> usize {
        control
            .entries()
            .iter()
            .filter(|e| e.kind == LayerKind::Base && e.visible)
            .count()
    }

    #[test]
    fn lone_base_layer_cannot_be_hidden() {
        let mut control = LayerControl::new();
        let street = control.add("Street Map", LayerKind::Base);
        control.add("Earthquakes", LayerKind::Overlay);

        control.set_visible(street, false);
        assert!(control.is_visible(street));
        assert_eq!(visible_bases(&control), 1);
    }

    #[test]
    fn exactly_one_base_layer_stays_visible() {
        let mut control = control();
        control.set_visible(0, false);
        assert_eq!(visible_bases(&control), 1);
        assert!(control.is_visible(0));

        control.set_visible(3, true);
        control.set_visible(3, false);
        assert_eq!(visible_bases(&control), 1);
        assert!(control.is_visible(3));
        assert!(!control.is_visible(0));
    }
}
