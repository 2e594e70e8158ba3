//! Integration tests for decorator chains painted through a component tree.

use trellis::decorator::ScratchBuffer;
use trellis::skin::PanelSkin;
use trellis::widgets::Panel;
use trellis::{BlurDecorator, Component, ComponentId, ComponentTree, Decorator, FadeDecorator};
use trellis_render::{Bounds, Color, Surface};

/// Paints the component unchanged but reports a two pixel shadow to the
/// right and below.
#[derive(Default)]
struct Shadow {
    scratch: ScratchBuffer,
}

impl Decorator for Shadow {
    fn prepare(&mut self, component: &Component, surface: &Surface) -> Surface {
        self.scratch
            .acquire(component.width(), component.height(), surface.local_clip())
    }

    fn update(&mut self, scratch: Surface, surface: &mut Surface) {
        surface.draw_surface(&scratch, 0, 0);
        self.scratch.release(scratch);
    }

    fn affected_area(&self, _component: &Component, area: Bounds) -> Bounds {
        Bounds::new(area.x, area.y, area.width + 2, area.height + 2)
    }
}

/// A white 50x50 root with a red child at (10, 10) sized 10x10.
fn scene() -> (ComponentTree, ComponentId) {
    let mut tree = ComponentTree::new();
    let root = tree.insert(Component::new(Panel).with_bounds(Bounds::new(0, 0, 50, 50)));
    tree.set_skin(root, PanelSkin::new().with_background_color(Color::WHITE))
        .unwrap();
    let child = tree
        .insert_child(root, Component::new(Panel).with_bounds(Bounds::new(10, 10, 10, 10)))
        .unwrap();
    tree.set_skin(child, PanelSkin::new().with_background_color(Color::RED))
        .unwrap();
    (tree, child)
}

fn paint(tree: &mut ComponentTree) -> Surface {
    let mut surface = Surface::new(50, 50);
    tree.paint(&mut surface);
    surface
}

#[test]
fn test_fade_blends_the_component_with_what_is_behind_it() {
    let (mut tree, child) = scene();
    tree.add_decorator(child, FadeDecorator::new(0.5).unwrap()).unwrap();

    let surface = paint(&mut tree);
    let faded = surface.pixel(15, 15).unwrap();
    assert_eq!(faded.r, 255);
    assert!((120..=135).contains(&faded.g), "green was {}", faded.g);
    assert!((120..=135).contains(&faded.b), "blue was {}", faded.b);
    assert_eq!(faded.a, 255);

    assert_eq!(surface.pixel(5, 5), Some(Color::WHITE));
    assert_eq!(surface.pixel(25, 25), Some(Color::WHITE));
}

#[test]
fn test_blur_leaves_a_uniform_fill_unchanged() {
    let (mut tree, child) = scene();
    tree.add_decorator(child, BlurDecorator::new(3).unwrap()).unwrap();

    let surface = paint(&mut tree);
    assert_eq!(surface.pixel(15, 15), Some(Color::RED));
    assert_eq!(surface.pixel(9, 9), Some(Color::WHITE));
}

#[test]
fn test_removing_the_decorator_restores_plain_painting() {
    let (mut tree, child) = scene();
    let plain = paint(&mut tree);

    tree.add_decorator(child, FadeDecorator::new(0.25).unwrap()).unwrap();
    assert_ne!(paint(&mut tree).pixel(15, 15), plain.pixel(15, 15));

    tree.remove_decorator(child, 0).unwrap();
    assert!(tree.component(child).unwrap().decorators().is_empty());
    assert_eq!(paint(&mut tree).image(), plain.image());
}

#[test]
fn test_out_of_range_decorator_index_is_rejected() {
    let (mut tree, child) = scene();
    assert!(tree.remove_decorator(child, 0).is_err());
}

#[test]
fn test_repaint_covers_the_decorated_area() {
    let (mut tree, child) = scene();
    tree.add_decorator(child, Shadow::default()).unwrap();
    tree.take_dirty();

    tree.repaint(child);
    assert_eq!(tree.take_dirty(), Some(Bounds::new(10, 10, 12, 12)));

    // The parent still clips the widened area.
    tree.set_location(child, 45, 45).unwrap();
    tree.take_dirty();
    tree.repaint(child);
    assert_eq!(tree.take_dirty(), Some(Bounds::new(45, 45, 5, 5)));
}

#[test]
fn test_custom_decorator_paints_through_the_chain() {
    let (mut tree, child) = scene();
    tree.add_decorator(child, Shadow::default()).unwrap();
    tree.add_decorator(child, BlurDecorator::new(3).unwrap()).unwrap();

    let surface = paint(&mut tree);
    assert_eq!(surface.pixel(15, 15), Some(Color::RED));
    assert_eq!(tree.component(child).unwrap().decorators().len(), 2);
}
