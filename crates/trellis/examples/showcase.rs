//! Headless tour of the toolkit: builds a small scene, drives it with
//! synthetic input, collapses a button and writes the result to a PNG.
//!
//! Run with: `cargo run -p trellis --example showcase -- out.png`

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use trellis::dispatch::DisplayInput;
use trellis::input::MouseButton;
use trellis::skin::{PanelSkin, TerraPushButtonSkin};
use trellis::transition::{CollapseTransition, TransitionDriver};
use trellis::widgets::{Button, ButtonPressListener, Panel};
use trellis::{Component, ComponentId, ComponentTree, FadeDecorator};
use trellis_render::{Bounds, Color, Surface};

struct PressCounter(Cell<u32>);

impl ButtonPressListener for PressCounter {
    fn button_pressed(&self, button: ComponentId) {
        self.0.set(self.0.get() + 1);
        tracing::info!(?button, presses = self.0.get(), "button pressed");
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let output = std::env::args().nth(1).unwrap_or_else(|| "showcase.png".into());

    let mut tree = ComponentTree::new();
    let root = tree.insert(Component::new(Panel).with_bounds(Bounds::new(0, 0, 240, 80)));
    tree.set_skin(root, PanelSkin::new().with_background_color(Color::WHITE))?;

    let ok = tree.insert_child(
        root,
        Component::new(Button::new("OK")).with_bounds(Bounds::new(10, 10, 100, 28)),
    )?;
    tree.set_skin(ok, TerraPushButtonSkin::new())?;

    let faded = tree.insert_child(
        root,
        Component::new(Button::toggle("Faded")).with_bounds(Bounds::new(120, 10, 100, 28)),
    )?;
    tree.set_skin(faded, TerraPushButtonSkin::new())?;
    tree.add_decorator(faded, FadeDecorator::new(0.5)?)?;

    let counter = Rc::new(PressCounter(Cell::new(0)));
    let listener: Rc<dyn ButtonPressListener> = counter.clone();
    tree.model::<Button>(ok)?.press_listeners().add(&listener);

    let mut input = DisplayInput::default();
    input.mouse_move(&mut tree, 20, 20);
    input.mouse_down(&mut tree, MouseButton::Left, 20, 20);
    input.mouse_up(&mut tree, MouseButton::Left, 20, 20);
    input.mouse_exit(&mut tree);
    println!("OK pressed {} time(s)", counter.0.get());

    let start = Instant::now();
    let mut driver = TransitionDriver::new();
    driver.add(CollapseTransition::new(faded, Duration::from_millis(200), 50)?, start);
    let mut now = start;
    while driver.tick(&mut tree, now) > 0 {
        now += Duration::from_millis(20);
    }
    println!("Faded button visible: {}", tree.component(faded)?.is_visible());

    let mut surface = Surface::new(240, 80);
    tree.paint(&mut surface);
    surface.image().save(&output)?;
    println!("Wrote {output}");
    Ok(())
}
