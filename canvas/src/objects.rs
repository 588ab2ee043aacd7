//! Object controller.
//!
//! Placed objects are host-manipulated image rectangles. The host hovers and
//! selects them; a selected object shows eight control squares and a delete
//! button. Pressing on a control square or the body starts a drag whose
//! bounds come from [`resize::drag_bounds`] on every pointer move. Nothing is
//! sent while dragging: the committed pose goes out as one `MoveObj` on
//! pointer release.

#[cfg(test)]
#[path = "objects_test.rs"]
mod objects_test;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use frames::{Message, MessageKind};

use crate::comms::Comms;
use crate::consts::{ICON_DELETE, OBJECT_BUTTON_OFFSET_PX};
use crate::doc::{Bounds, PlacedObj, PlacementId};
use crate::hit::{self, DragDirection};
use crate::popup::{Anchor, PopupButton};
use crate::registry::Subscription;
use crate::render;
use crate::resize;
use crate::surface::Surface;
use crate::viewport::{BoardPoint, RenderPass, RepaintFlag, Viewport};

const RENDER_KEY: &str = "ObjManagerRender";
const RENDER_DEPTH: i32 = 1;

/// The object delete button's only action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteObject;

/// Outcome of a primary press offered to the object layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Press {
    Missed,
    /// A drag started on the selected object.
    Dragging(DragDirection),
    /// The delete button was pressed; the host must confirm.
    ConfirmDelete(PlacementId),
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    dir: DragDirection,
    origin: BoardPoint,
    start: Bounds,
}

/// Placed objects plus hover, selection and drag state.
pub struct ObjManager {
    comms: Rc<Comms>,
    repaint: RepaintFlag,
    cell_size: f64,
    objs: BTreeMap<PlacementId, PlacedObj>,
    mouse: BoardPoint,
    scale: f64,
    hovered: Option<PlacementId>,
    selected: Option<PlacementId>,
    delete_button: Option<PopupButton<DeleteObject>>,
    drag: Option<Drag>,
    subscriptions: Vec<Subscription>,
}

impl ObjManager {
    /// Create a manager and hook it into `comms` and `viewport`.
    pub fn attach(comms: Rc<Comms>, viewport: &Viewport) -> Rc<RefCell<Self>> {
        let manager = Rc::new(RefCell::new(Self {
            comms: Rc::clone(&comms),
            repaint: viewport.repaint().clone(),
            cell_size: viewport.cell_size(),
            objs: BTreeMap::new(),
            mouse: BoardPoint::default(),
            scale: viewport.scale(),
            hovered: None,
            selected: None,
            delete_button: None,
            drag: None,
            subscriptions: Vec::new(),
        }));

        let weak = Rc::downgrade(&manager);
        let mut subscriptions: Vec<Subscription> = [
            (MessageKind::PlaceObj, "ObjLayerAdd"),
            (MessageKind::DeleteObj, "ObjManagerDelete"),
            (MessageKind::MoveObj, "ObjManagerMove"),
        ]
        .into_iter()
        .map(|(kind, key)| {
            let weak = Weak::clone(&weak);
            comms.add_listener(kind, key, move |message| with_manager(&weak, |m| m.apply(message)))
        })
        .collect();
        subscriptions.push(viewport.add_render_listener(RENDER_KEY, RENDER_DEPTH, move |surface, pass| {
            with_manager(&weak, |m| m.render(surface, pass));
        }));
        manager.borrow_mut().subscriptions = subscriptions;
        manager
    }

    // --- Inbound ---

    pub fn apply(&mut self, message: &Message) {
        match message {
            Message::PlaceObj(placement) => {
                let Some(obj) = PlacedObj::from_placement(placement.clone()) else {
                    tracing::warn!(obj_id = placement.obj_id, "object placement without a placement id");
                    return;
                };
                if self.is_dragging(&obj.id) {
                    tracing::debug!(id = %obj.id, "placement for object being dragged; keeping local pose");
                    return;
                }
                self.objs.insert(obj.id.clone(), obj);
            }
            Message::DeleteObj { obj_id } => {
                if self.selected.as_ref() == Some(obj_id) {
                    self.clear_selection();
                }
                if self.objs.remove(obj_id).is_none() {
                    tracing::warn!(id = %obj_id, "delete for unknown object");
                }
            }
            Message::MoveObj(update) => {
                if self.is_dragging(&update.obj_id) {
                    return;
                }
                match self.objs.get_mut(&update.obj_id) {
                    Some(obj) => obj.apply_move(update),
                    None => tracing::warn!(id = %update.obj_id, "move for unknown object"),
                }
            }
            _ => return,
        }
        self.sync_button();
        self.refresh_hover();
        self.repaint.request();
    }

    // --- Input ---

    /// Track the pointer in board space. While dragging, this resizes or
    /// moves the selected object.
    pub fn set_mouse_coord(&mut self, board: BoardPoint, scale: f64) {
        let before = (self.hovered.clone(), self.is_pointer_over_popup());
        self.mouse = board;
        self.scale = scale;

        if let Some(drag) = self.drag {
            if let Some(obj) = self.selected.as_ref().and_then(|id| self.objs.get_mut(id)) {
                obj.bounds = resize::drag_bounds(drag.dir, &drag.start, drag.origin, board, self.cell_size);
                self.repaint.request();
            }
        }
        self.sync_button();
        self.refresh_hover();
        if before != (self.hovered.clone(), self.is_pointer_over_popup()) {
            self.repaint.request();
        }
    }

    /// Offer a primary press. Host only.
    pub fn on_pointer_down(&mut self) -> Press {
        if !self.comms.is_host() {
            return Press::Missed;
        }
        if let Some(DeleteObject) = self.delete_button.as_ref().and_then(PopupButton::on_click) {
            if let Some(id) = &self.selected {
                return Press::ConfirmDelete(id.clone());
            }
        }

        if let Some(hovered) = self.hovered.clone() {
            if self.selected.as_ref() != Some(&hovered) {
                self.selected = Some(hovered);
                self.delete_button = None;
                self.sync_button();
            }
        }

        let target = self
            .selected
            .as_ref()
            .and_then(|id| self.objs.get(id))
            .and_then(|obj| hit::hit_handle(&obj.bounds, self.mouse, self.scale).map(|dir| (dir, obj.bounds)));
        self.repaint.request();
        match target {
            Some((dir, start)) => {
                self.drag = Some(Drag { dir, origin: self.mouse, start });
                Press::Dragging(dir)
            }
            None => {
                self.clear_selection();
                Press::Missed
            }
        }
    }

    /// End a drag, committing the final pose if it changed. Returns whether
    /// a `MoveObj` was sent.
    pub fn on_pointer_up(&mut self) -> bool {
        let Some(drag) = self.drag.take() else {
            return false;
        };
        let Some(obj) = self.selected.as_ref().and_then(|id| self.objs.get(id)) else {
            return false;
        };
        if obj.bounds == drag.start {
            return false;
        }
        let update = obj.to_move();
        tracing::debug!(id = %update.obj_id, x = update.x, y = update.y, w = update.w, h = update.h, "commit object pose");
        self.comms.move_obj(update);
        self.sync_button();
        self.repaint.request();
        true
    }

    /// Drop the selection. A drag in progress is abandoned and the object
    /// returns to its pose from before the drag.
    pub fn on_escape(&mut self) {
        if self.selected.is_some() {
            self.repaint.request();
        }
        self.clear_selection();
    }

    /// Ask the server to place asset `obj_id` with its top-left at `cell`.
    /// The size is the asset's natural size when cached, otherwise one cell.
    pub fn place_at(&mut self, cell: BoardPoint, obj_id: i64) -> bool {
        if !self.comms.is_host() {
            return false;
        }
        let (w, h) = self
            .comms
            .asset_size(obj_id)
            .map_or((self.cell_size, self.cell_size), |(w, h)| (f64::from(w), f64::from(h)));
        self.comms.place_obj(obj_id, &Bounds::new(cell.x, cell.y, w, h));
        true
    }

    // --- Internals ---

    fn is_dragging(&self, id: &str) -> bool {
        self.drag.is_some() && self.selected.as_deref() == Some(id)
    }

    /// Topmost object under the pointer; only the host hovers objects.
    fn refresh_hover(&mut self) {
        self.hovered = if self.comms.is_host() {
            self.objs.values().rev().find(|obj| obj.bounds.contains(self.mouse)).map(|obj| obj.id.clone())
        } else {
            None
        };
    }

    /// Keep the delete button just above-left of the selected object.
    fn sync_button(&mut self) {
        let Some(obj) = self.selected.as_ref().and_then(|id| self.objs.get(id)) else {
            self.delete_button = None;
            return;
        };
        let offset = OBJECT_BUTTON_OFFSET_PX / self.scale.min(1.0);
        let cell = BoardPoint::new(obj.bounds.x - offset, obj.bounds.y - offset);
        match &mut self.delete_button {
            Some(button) => button.set_position(cell),
            None => {
                self.delete_button =
                    Some(PopupButton::new(cell, self.cell_size, Anchor::TopLeft, ICON_DELETE, DeleteObject));
            }
        }
        if let Some(button) = &mut self.delete_button {
            button.set_scale(self.scale);
            button.set_mouse_coord(self.mouse);
        }
    }

    fn clear_selection(&mut self) {
        if let Some(drag) = self.drag.take() {
            if let Some(obj) = self.selected.as_ref().and_then(|id| self.objs.get_mut(id)) {
                tracing::debug!(id = %obj.id, "drag abandoned; restoring pose");
                obj.bounds = drag.start;
            }
        }
        self.selected = None;
        self.delete_button = None;
    }

    fn render(&mut self, surface: &mut dyn Surface, pass: &RenderPass) {
        self.scale = pass.scale;
        self.refresh_hover();
        for obj in self.objs.values() {
            let image = self.comms.object_image(obj.obj_id);
            render::draw_object(surface, image.as_deref(), &obj.bounds);

            let selected = self.selected.as_ref() == Some(&obj.id);
            if selected || self.hovered.as_ref() == Some(&obj.id) {
                render::draw_object_outline(surface, &obj.bounds, selected, pass.scale);
            }
        }
        self.sync_button();
        if let Some(button) = &self.delete_button {
            button.render(surface);
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&PlacedObj> {
        self.objs.get(id)
    }

    pub fn objects(&self) -> impl Iterator<Item = &PlacedObj> {
        self.objs.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objs.is_empty()
    }

    #[must_use]
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    #[must_use]
    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    #[must_use]
    pub fn is_dragging_any(&self) -> bool {
        self.drag.is_some()
    }

    #[must_use]
    pub fn delete_button(&self) -> Option<&PopupButton<DeleteObject>> {
        self.delete_button.as_ref()
    }

    #[must_use]
    pub fn is_pointer_over_popup(&self) -> bool {
        self.delete_button.as_ref().is_some_and(PopupButton::is_hovered)
    }

    #[must_use]
    pub fn subscription_keys(&self) -> Vec<&str> {
        self.subscriptions.iter().map(Subscription::key).collect()
    }

    /// The handle a press would grab right now, or the active drag's.
    #[must_use]
    pub fn handle_under_pointer(&self) -> Option<DragDirection> {
        if let Some(drag) = self.drag {
            return Some(drag.dir);
        }
        let obj = self.objs.get(self.selected.as_ref()?)?;
        hit::hit_handle(&obj.bounds, self.mouse, self.scale)
    }
}

fn with_manager(weak: &Weak<RefCell<ObjManager>>, f: impl FnOnce(&mut ObjManager)) {
    let Some(manager) = weak.upgrade() else {
        return;
    };
    match manager.try_borrow_mut() {
        Ok(mut manager) => f(&mut manager),
        Err(_) => tracing::warn!("object manager busy; event skipped"),
    }
}
