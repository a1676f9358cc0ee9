//! Input collaborator for the raylib window.
//!
//! A left click becomes a [`SpawnRequest`] at the cursor. Other key presses
//! are only logged.
use bevy_ecs::prelude::*;
use log::info;
use raylib::prelude::*;

use crate::events::spawn::SpawnRequest;

/// Read this frame's mouse and keyboard events and forward them.
pub fn poll_input(world: &mut World, rl: &mut RaylibHandle) {
    let mouse = rl.get_mouse_position();
    if rl.is_mouse_button_pressed(MouseButton::MOUSE_BUTTON_LEFT) {
        world.trigger(SpawnRequest {
            x: mouse.x,
            y: mouse.y,
        });
        world.flush();
    }
    while let Some(key) = rl.get_key_pressed() {
        info!("Key {:?} pressed with mouse at ({}, {})", key, mouse.x, mouse.y);
    }
}
