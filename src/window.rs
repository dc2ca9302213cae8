use std::{cell::RefCell, rc::Rc, time::Duration};

use gtk4::{
    cairo::{Context, Error},
    glib::{idle_add_local_once, timeout_add_local, ControlFlow, ExitCode, Propagation},
    prelude::{
        ApplicationExt, ApplicationExtManual, BoxExt, CheckButtonExt, DrawingAreaExtManual,
        FrameExt, GestureDragExt, GestureSingleExt, GtkWindowExt, WidgetExt,
    },
    Align, Application, ApplicationWindow, CheckButton, DrawingArea, EventControllerScroll,
    EventControllerScrollFlags, Frame, GestureClick, GestureDrag, Orientation, Overlay, Separator,
};
use tracing::warn;

use crate::{
    control::{LayerControl, LayerKind},
    geometry::FocusRange,
    view::ViewState,
};

pub trait Layer {
    fn draw(
        &self,
        drawing_area: &DrawingArea,
        cr: &Context,
        focus_range: &FocusRange,
    ) -> Result<(), Error>;

    /// Primary click at widget coordinates (`x`, `y`). Returns whether the
    /// layer consumed it.
    fn click(
        &self,
        _x: f64,
        _y: f64,
        _drawing_area: &DrawingArea,
        _focus_range: &FocusRange,
    ) -> bool {
        false
    }
}

struct RegisteredLayer {
    layer: Rc<RefCell<dyn Layer>>,
    z_index: usize,
    /// Entry in the layer control, `None` for layers that are always shown.
    control_index: Option<usize>,
    kind: Option<LayerKind>,
}

pub struct Visualizer {
    app: Application,
    title: String,
    window_width: i32,
    window_height: i32,
    view: ViewState,
    control: LayerControl,
    layers: Vec<RegisteredLayer>,
}

impl Visualizer {
    pub fn new(window_width: i32, window_height: i32, view: ViewState) -> Self {
        let app = Application::builder()
            .application_id("dev.peruki.quakelayers")
            .build();
        Self {
            app,
            title: "Earthquakes".to_string(),
            window_width,
            window_height,
            view,
            control: LayerControl::new(),
            layers: Vec::new(),
        }
    }

    /// Adds a layer that is always drawn and has no toggle.
    pub fn add_layer(&mut self, layer: Rc<RefCell<dyn Layer>>, z_index: usize) {
        self.layers.push(RegisteredLayer {
            layer,
            z_index,
            control_index: None,
            kind: None,
        });
    }

    pub fn add_base_layer(&mut self, name: &str, layer: Rc<RefCell<dyn Layer>>, z_index: usize) {
        self.add_toggled(name, LayerKind::Base, layer, z_index);
    }

    pub fn add_overlay(&mut self, name: &str, layer: Rc<RefCell<dyn Layer>>, z_index: usize) {
        self.add_toggled(name, LayerKind::Overlay, layer, z_index);
    }

    fn add_toggled(
        &mut self,
        name: &str,
        kind: LayerKind,
        layer: Rc<RefCell<dyn Layer>>,
        z_index: usize,
    ) {
        let control_index = self.control.add(name, kind);
        self.layers.push(RegisteredLayer {
            layer,
            z_index,
            control_index: Some(control_index),
            kind: Some(kind),
        });
    }

    pub fn run(self) -> ExitCode {
        let Visualizer {
            app,
            title,
            window_width,
            window_height,
            view,
            control,
            mut layers,
        } = self;
        layers.sort_by_key(|layer| layer.z_index);

        let layers = Rc::new(layers);
        let view = Rc::new(RefCell::new(view));
        let control = Rc::new(RefCell::new(control));

        app.connect_activate(move |app| {
            let window = ApplicationWindow::builder()
                .application(app)
                .default_width(window_width)
                .default_height(window_height)
                .title(title.as_str())
                .build();

            let drawing_area = DrawingArea::new();

            drawing_area.set_draw_func({
                let view = Rc::clone(&view);
                let layers = Rc::clone(&layers);
                let control = Rc::clone(&control);
                move |drawing_area, cr, _, _| {
                    if let Err(err) = draw_frame(drawing_area, cr, &view, &layers, &control) {
                        warn!("failed to draw frame: {err}");
                    }
                }
            });

            let overlay = Overlay::new();
            overlay.set_child(Some(&drawing_area));
            overlay.add_overlay(&build_layer_panel(&control));
            window.set_child(Some(&overlay));

            let gesture_drag = GestureDrag::new();
            let last_position = Rc::new(RefCell::new(None));
            gesture_drag.connect_drag_update({
                let view = Rc::clone(&view);
                let last_position = Rc::clone(&last_position);
                move |_, x, y| {
                    let mut last_position = last_position.borrow_mut();
                    let (dx, dy) = match *last_position {
                        Some((last_x, last_y)) => (x - last_x, y - last_y),
                        None => (x, y),
                    };
                    *last_position = Some((x, y));
                    let mut view = view.borrow_mut();
                    view.move_focus(dx, dy);
                }
            });

            gesture_drag.connect_drag_end({
                let last_position = Rc::clone(&last_position);
                move |_, _, _| {
                    *last_position.borrow_mut() = None;
                }
            });

            let gesture_click = GestureClick::new();
            gesture_click.set_button(gtk4::gdk::BUTTON_PRIMARY);
            gesture_click.connect_released({
                let view = Rc::clone(&view);
                let layers = Rc::clone(&layers);
                let control = Rc::clone(&control);
                let drawing_area = drawing_area.clone();
                move |_, _, x, y| {
                    let view = view.borrow();
                    let control = control.borrow();
                    for registered in layers.iter().rev() {
                        if !registered.is_visible(&control) {
                            continue;
                        }
                        if registered
                            .layer
                            .borrow()
                            .click(x, y, &drawing_area, view.focus_range())
                        {
                            break;
                        }
                    }
                }
            });

            let event_controller_scroll =
                EventControllerScroll::new(EventControllerScrollFlags::VERTICAL);
            event_controller_scroll.connect_scroll({
                let view = Rc::clone(&view);
                move |_, _, dy| {
                    let mut view = view.borrow_mut();
                    view.zoom(dy);
                    Propagation::Stop
                }
            });

            drawing_area.add_controller(gesture_drag);
            drawing_area.add_controller(gesture_click);
            drawing_area.add_controller(event_controller_scroll);

            window.present();

            let tick = move || {
                drawing_area.queue_draw();
                ControlFlow::Continue
            };
            timeout_add_local(Duration::from_millis(1000 / 40), tick);
        });

        // Command-line arguments belong to the binary, not to GTK.
        app.run_with_args::<&str>(&[])
    }
}

impl RegisteredLayer {
    fn is_visible(&self, control: &LayerControl) -> bool {
        self.control_index
            .map_or(true, |index| control.is_visible(index))
    }
}

fn draw_frame(
    drawing_area: &DrawingArea,
    cr: &Context,
    view: &RefCell<ViewState>,
    layers: &[RegisteredLayer],
    control: &RefCell<LayerControl>,
) -> Result<(), Error> {
    cr.set_source_rgb(170.0 / 255.0, 211.0 / 255.0, 223.0 / 255.0);
    cr.paint()?;

    let mut view = view.borrow_mut();
    view.update();
    let control = control.borrow();

    let (base, rest): (Vec<_>, Vec<_>) = layers
        .iter()
        .filter(|registered| registered.is_visible(&control))
        .partition(|registered| registered.kind == Some(LayerKind::Base));

    for registered in base {
        registered
            .layer
            .borrow()
            .draw(drawing_area, cr, view.focus_range())?;
    }

    view.draw_graticule(drawing_area, cr)?;

    for registered in rest {
        registered
            .layer
            .borrow()
            .draw(drawing_area, cr, view.focus_range())?;
    }

    Ok(())
}

/// Always-expanded panel with radio buttons for base layers and check buttons
/// for overlays.
fn build_layer_panel(control: &Rc<RefCell<LayerControl>>) -> Frame {
    let column = gtk4::Box::new(Orientation::Vertical, 4);
    column.set_margin_top(6);
    column.set_margin_bottom(6);
    column.set_margin_start(8);
    column.set_margin_end(8);

    let entries = control.borrow().entries().to_vec();
    let mut base_group: Option<CheckButton> = None;

    for kind in [LayerKind::Base, LayerKind::Overlay] {
        if kind == LayerKind::Overlay && base_group.is_some() {
            column.append(&Separator::new(Orientation::Horizontal));
        }

        for (index, entry) in entries.iter().enumerate().filter(|(_, e)| e.kind == kind) {
            let button = CheckButton::with_label(&entry.name);
            if kind == LayerKind::Base {
                match &base_group {
                    Some(leader) => button.set_group(Some(leader)),
                    None => base_group = Some(button.clone()),
                }
            }
            button.set_active(entry.visible);
            button.connect_toggled({
                let control = Rc::clone(control);
                move |button| {
                    let active = button.is_active();
                    control.borrow_mut().set_visible(index, active);
                    if kind == LayerKind::Base && !active {
                        // Deferred until the group has moved to its new
                        // selection; a lone base layer stays ticked.
                        let button = button.clone();
                        let control = Rc::clone(&control);
                        idle_add_local_once(move || {
                            if control.borrow().is_visible(index) {
                                button.set_active(true);
                            }
                        });
                    }
                }
            });
            column.append(&button);
        }
    }

    let frame = Frame::new(Some("Layers"));
    frame.set_child(Some(&column));
    frame.set_halign(Align::End);
    frame.set_valign(Align::Start);
    frame.set_margin_top(10);
    frame.set_margin_end(10);
    frame.add_css_class("view");
    frame
}
