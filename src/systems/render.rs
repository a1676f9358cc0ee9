use bevy_ecs::prelude::*;
use raylib::prelude::*;

use crate::registry;

/// Draw every live body as a filled quad built from its four corners, plus a
/// short status line.
pub fn render_pass(world: &mut World, d: &mut RaylibDrawHandle) {
    d.clear_background(Color::BLACK);

    let mut count = 0;
    registry::for_each_body(world, |body| {
        let [c0, c1, c2, c3] = body.corners().map(|c| Vector2 { x: c.x, y: c.y });
        // raylib wants counter-clockwise triangles in screen space (y down)
        d.draw_triangle(c0, c3, c2, Color::WHITE);
        d.draw_triangle(c0, c2, c1, Color::WHITE);
        count += 1;
    });

    let text = format!("Click to drop a block | Bodies: {}", count);
    d.draw_text(&text, 10, 10, 10, Color::GRAY);
}
