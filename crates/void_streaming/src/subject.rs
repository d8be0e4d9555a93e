//! Subjects placed into levels, and the input bridge used during transitions

use std::rc::Rc;

use glam::Vec3;

use crate::navigation::Facing;

/// Something that can be placed into a level (player, companion, camera rig)
pub trait PlacementSubject {
    /// Name used in notifications and logs
    fn name(&self) -> &str;

    /// Move the subject to `position` facing `facing`
    fn place_in_level(&self, position: Vec3, facing: Facing);

    /// Called when the level the subject was prepared in becomes active
    fn on_level_enter(&self);

    /// Called when that level is deactivated
    fn on_level_exit(&self);
}

/// Input control bridge, frozen for the duration of a transition
pub trait InputControl {
    fn revoke_input(&self);
    fn restore_input(&self);
}

/// Identity comparison for shared subjects
pub(crate) fn same_subject(a: &Rc<dyn PlacementSubject>, b: &Rc<dyn PlacementSubject>) -> bool {
    std::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
}
