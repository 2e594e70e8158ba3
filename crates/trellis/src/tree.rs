//! The component tree.
//!
//! [`ComponentTree`] owns every component in slotmap storage and is the only
//! way to change one: structure, attributes, focus, skins, decorators and the
//! widget-specific operations defined next to each widget model. Components
//! refer to their parent and children through [`ComponentId`] handles.
//!
//! # Skins and re-entrancy
//!
//! While a skin handles a callback it is *checked out* of its component, and
//! the skin reaches back through a [`SkinHost`] backed by the tree. Anything
//! the skin triggers that would notify the same skin again (a press that
//! changes a toggle button's state, a focus change it requested) is queued on
//! the component and delivered once the callback returns.
//!
//! # Deferred work
//!
//! Listeners are notified while the tree is borrowed, so they receive ids
//! only and post any mutation to the tree's [`TaskQueue`]. The queue, along
//! with finished background image loads, is drained by
//! [`process_tasks`](ComponentTree::process_tasks).

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use slotmap::SlotMap;
use trellis_core::TaskQueue;
use trellis_core::logging::{span_names, targets};
use trellis_render::{
    Bounds, CompletedLoad, Dimensions, ImageLoader, LoadQueue, LoadTicket, Point, ResourceCache,
    Surface,
};

use crate::component::{Component, ComponentId};
use crate::config::ToolkitConfig;
use crate::decorator::{self, Decorator};
use crate::error::{WidgetError, WidgetResult};
use crate::input::FocusDirection;
use crate::skin::{Skin, SkinHost, SkinNotice, SkinView, TreeTask};

/// Image sources shared by every image view in a tree.
#[derive(Debug, Clone)]
pub(crate) struct Resources {
    pub(crate) cache: Arc<ResourceCache>,
    pub(crate) loader: Arc<ImageLoader>,
}

/// What one call to [`ComponentTree::process_tasks`] did.
#[derive(Debug, Default)]
pub struct TaskReport {
    /// Deferred tasks executed.
    pub tasks: usize,
    /// Background-loaded images applied to their views.
    pub images_applied: usize,
    /// Background loads that failed, by the view that requested them.
    pub failures: Vec<(ComponentId, WidgetError)>,
}

/// Owner of all components.
pub struct ComponentTree {
    components: SlotMap<ComponentId, Component>,
    roots: Vec<ComponentId>,
    focused: Option<ComponentId>,
    dirty: Option<Bounds>,
    tasks: TaskQueue<ComponentTree>,
    pub(crate) resources: Resources,
    /// Where the shared loader delivers this tree's background loads.
    pub(crate) loads: LoadQueue,
    pub(crate) pending_loads: HashMap<LoadTicket, ComponentId>,
}

impl Default for ComponentTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentTree {
    /// Create an empty tree with its own resource cache and image loader.
    pub fn new() -> Self {
        Self::with_resources(Arc::new(ResourceCache::new()), Arc::new(ImageLoader::new()))
    }

    /// Create an empty tree that shares a resource cache and image loader.
    ///
    /// Background loads started through this tree come back to this tree
    /// only, whoever else uses the loader.
    pub fn with_resources(cache: Arc<ResourceCache>, loader: Arc<ImageLoader>) -> Self {
        Self {
            components: SlotMap::with_key(),
            roots: Vec::new(),
            focused: None,
            dirty: None,
            tasks: TaskQueue::new(),
            resources: Resources { cache, loader },
            loads: LoadQueue::new(),
            pending_loads: HashMap::new(),
        }
    }

    /// Create an empty tree whose resource names resolve against the
    /// configured resource root.
    pub fn from_config(config: &ToolkitConfig) -> Self {
        let loader = match &config.resources.root {
            Some(root) => ImageLoader::new().with_resource_root(root),
            None => ImageLoader::new(),
        };
        Self::with_resources(Arc::new(ResourceCache::new()), Arc::new(loader))
    }

    pub fn resource_cache(&self) -> &Arc<ResourceCache> {
        &self.resources.cache
    }

    pub fn image_loader(&self) -> &Arc<ImageLoader> {
        &self.resources.loader
    }

    /// A handle to the deferred task queue.
    pub fn tasks(&self) -> TaskQueue<ComponentTree> {
        self.tasks.clone()
    }

    // =========================================================================
    // Structure
    // =========================================================================

    /// Add a detached component as a new root.
    pub fn insert(&mut self, mut component: Component) -> ComponentId {
        component.parent = None;
        component.children.clear();
        let model = component.model_type();
        let id = self.components.insert(component);
        self.roots.push(id);
        tracing::trace!(target: targets::COMPONENT, ?id, model, "component inserted");
        id
    }

    /// Insert a component and attach it to `parent` in one step.
    pub fn insert_child(&mut self, parent: ComponentId, component: Component) -> WidgetResult<ComponentId> {
        self.component(parent)?;
        let id = self.insert(component);
        self.add_child(parent, id)?;
        Ok(id)
    }

    /// Make `child` the last child of `parent`, detaching it from wherever it
    /// was before.
    pub fn add_child(&mut self, parent: ComponentId, child: ComponentId) -> WidgetResult<()> {
        self.component(parent)?;
        self.component(child)?;
        if self.is_ancestor_of(child, parent) {
            return Err(WidgetError::invalid(
                "a component cannot be added to itself or its descendants",
            ));
        }

        self.repaint(child);
        self.detach(child);
        if let Some(component) = self.components.get_mut(child) {
            component.parent = Some(parent);
        }
        if let Some(component) = self.components.get_mut(parent) {
            component.children.push(child);
        }
        tracing::trace!(target: targets::COMPONENT, ?parent, ?child, "child added");
        self.invalidate(parent);
        self.repaint(child);
        Ok(())
    }

    /// Remove a component and its whole subtree.
    ///
    /// Skins are uninstalled and focus is cleared if it was inside the
    /// subtree.
    pub fn remove(&mut self, id: ComponentId) -> WidgetResult<()> {
        self.component(id)?;
        if self.focused.is_some_and(|focused| self.is_ancestor_of(id, focused)) {
            self.clear_focus();
        }
        self.repaint(id);
        let parent = self.parent(id);
        self.detach(id);
        if let Some(parent) = parent {
            self.invalidate(parent);
        }

        let subtree = self.descendants(id);
        for removed in subtree {
            if let Some(mut component) = self.components.remove(removed) {
                if let Some(skin) = component.skin.as_mut() {
                    skin.uninstall();
                }
            }
        }
        self.pending_loads.retain(|_, target| self.components.contains_key(*target));
        tracing::trace!(target: targets::COMPONENT, ?id, "component removed");
        Ok(())
    }

    fn detach(&mut self, id: ComponentId) {
        let parent = self.components.get_mut(id).and_then(|c| c.parent.take());
        match parent {
            Some(parent) => {
                if let Some(component) = self.components.get_mut(parent) {
                    component.children.retain(|&child| child != id);
                }
            }
            None => self.roots.retain(|&root| root != id),
        }
    }

    /// Whether `ancestor` is `id` or one of its ancestors.
    fn is_ancestor_of(&self, ancestor: ComponentId, id: ComponentId) -> bool {
        let mut current = Some(id);
        while let Some(current_id) = current {
            if current_id == ancestor {
                return true;
            }
            current = self.parent(current_id);
        }
        false
    }

    /// `id` followed by its descendants in depth-first pre-order.
    pub fn descendants(&self, id: ComponentId) -> Vec<ComponentId> {
        let mut result = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(component) = self.components.get(current) else {
                continue;
            };
            result.push(current);
            stack.extend(component.children.iter().rev().copied());
        }
        result
    }

    pub fn get(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(id)
    }

    /// The component, or [`WidgetError::ComponentNotFound`].
    pub fn component(&self, id: ComponentId) -> WidgetResult<&Component> {
        self.components
            .get(id)
            .ok_or(WidgetError::ComponentNotFound(id))
    }

    pub(crate) fn component_mut(&mut self, id: ComponentId) -> WidgetResult<&mut Component> {
        self.components
            .get_mut(id)
            .ok_or(WidgetError::ComponentNotFound(id))
    }

    pub fn contains(&self, id: ComponentId) -> bool {
        self.components.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Components without a parent, in insertion order.
    pub fn roots(&self) -> &[ComponentId] {
        &self.roots
    }

    pub fn parent(&self, id: ComponentId) -> Option<ComponentId> {
        self.components.get(id).and_then(|c| c.parent)
    }

    pub fn children(&self, id: ComponentId) -> &[ComponentId] {
        self.components.get(id).map_or(&[], |c| c.children.as_slice())
    }

    /// Ancestors from the parent up to the root.
    pub fn ancestors(&self, id: ComponentId) -> Vec<ComponentId> {
        let mut result = Vec::new();
        let mut current = self.parent(id);
        while let Some(current_id) = current {
            result.push(current_id);
            current = self.parent(current_id);
        }
        result
    }

    /// A component's model as a `T`.
    pub fn model<T: Any>(&self, id: ComponentId) -> WidgetResult<&T> {
        self.component(id)?.model::<T>()
    }

    /// A component's model as a mutable `T`.
    ///
    /// Changing a model directly does not notify anybody; prefer the tree
    /// operations of the widget.
    pub fn model_mut<T: Any>(&mut self, id: ComponentId) -> WidgetResult<&mut T> {
        self.component_mut(id)?.model_mut::<T>()
    }

    // =========================================================================
    // Skins and decorators
    // =========================================================================

    /// Install a skin, returning the previous one.
    pub fn set_skin<S: Skin>(&mut self, id: ComponentId, skin: S) -> WidgetResult<Option<Box<dyn Skin>>> {
        self.set_boxed_skin(id, Box::new(skin))
    }

    /// Install a boxed skin, returning the previous one.
    ///
    /// The previous skin is uninstalled before the new one is installed. If
    /// the new skin rejects the component, the previous skin is put back.
    pub fn set_boxed_skin(
        &mut self,
        id: ComponentId,
        mut skin: Box<dyn Skin>,
    ) -> WidgetResult<Option<Box<dyn Skin>>> {
        let component = self.component_mut(id)?;
        if component.skin_checked_out {
            return Err(WidgetError::invalid(
                "cannot replace a skin while it is handling a callback",
            ));
        }
        let mut previous = component.skin.take();
        if let Some(previous) = previous.as_mut() {
            previous.uninstall();
        }

        let component = self.component(id)?;
        if let Err(error) = skin.install(id, component) {
            tracing::debug!(
                target: targets::SKIN,
                component = ?id,
                skin = skin.type_name(),
                %error,
                "skin rejected component"
            );
            if let Some(mut previous) = previous {
                match previous.install(id, component) {
                    Ok(()) => self.component_mut(id)?.skin = Some(previous),
                    Err(reinstall) => tracing::warn!(
                        target: targets::SKIN,
                        component = ?id,
                        error = %reinstall,
                        "previous skin could not be reinstalled"
                    ),
                }
            }
            return Err(error);
        }

        let focusable = skin.is_focusable();
        let component = self.component_mut(id)?;
        component.skin = Some(skin);
        component.focusable = focusable;
        component.pending.clear();
        if !focusable && self.focused == Some(id) {
            self.clear_focus();
        }
        self.invalidate(id);
        self.repaint(id);
        Ok(previous)
    }

    /// The installed skin, unless it is handling a callback.
    pub fn skin(&self, id: ComponentId) -> Option<&dyn Skin> {
        self.components.get(id).and_then(Component::skin)
    }

    /// The installed skin as a concrete type.
    pub fn skin_as<S: Skin>(&self, id: ComponentId) -> WidgetResult<&S> {
        self.component(id)?.skin_as::<S>()
    }

    /// Append a decorator to the component's chain.
    pub fn add_decorator(&mut self, id: ComponentId, decorator: impl Decorator + 'static) -> WidgetResult<()> {
        self.repaint(id);
        self.component_mut(id)?.decorators.push(Box::new(decorator));
        self.repaint(id);
        Ok(())
    }

    /// Remove the decorator at `index` from the component's chain.
    pub fn remove_decorator(&mut self, id: ComponentId, index: usize) -> WidgetResult<Box<dyn Decorator>> {
        let count = self.component(id)?.decorators.len();
        if index >= count {
            return Err(WidgetError::invalid(format!(
                "decorator index {index} out of range for {count} decorators"
            )));
        }
        self.repaint(id);
        let removed = self.component_mut(id)?.decorators.remove(index);
        self.repaint(id);
        Ok(removed)
    }

    /// Run `f` with the component's skin checked out.
    ///
    /// Returns `None` when the component has no skin or the skin is already
    /// busy. Notices raised for the component while `f` runs are delivered
    /// before the skin is checked back in.
    pub(crate) fn with_skin<R>(
        &mut self,
        id: ComponentId,
        f: impl FnOnce(&mut dyn Skin, &mut ComponentContext<'_>) -> R,
    ) -> Option<R> {
        let component = self.components.get_mut(id)?;
        let mut skin = component.skin.take()?;
        component.skin_checked_out = true;
        let result = f(skin.as_mut(), &mut ComponentContext { tree: self, id });
        self.check_in(id, skin);
        Some(result)
    }

    fn check_in(&mut self, id: ComponentId, mut skin: Box<dyn Skin>) {
        loop {
            let Some(component) = self.components.get_mut(id) else {
                skin.uninstall();
                return;
            };
            let Some(notice) = component.pending.pop_front() else {
                component.skin = Some(skin);
                component.skin_checked_out = false;
                return;
            };
            notice.deliver(skin.as_mut(), &mut ComponentContext { tree: self, id });
        }
    }

    /// Tell a component's skin about a change, now or once it is free.
    pub(crate) fn notify_skin(&mut self, id: ComponentId, notice: SkinNotice) {
        let Some(component) = self.components.get_mut(id) else {
            return;
        };
        if component.skin_checked_out {
            component.pending.push_back(notice);
            return;
        }
        self.with_skin(id, |skin, host| notice.deliver(skin, host));
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    pub fn set_bounds(&mut self, id: ComponentId, bounds: Bounds) -> WidgetResult<()> {
        let component = self.component_mut(id)?;
        let previous = component.bounds;
        if previous == bounds {
            return Ok(());
        }
        component.bounds = bounds;
        let parent = component.parent;
        if previous.size() != bounds.size() {
            self.invalidate(id);
        }
        match parent {
            Some(parent) => self.repaint_area(parent, previous.union(&bounds)),
            None => self.mark_dirty(previous.union(&bounds)),
        }
        Ok(())
    }

    pub fn set_size(&mut self, id: ComponentId, width: u32, height: u32) -> WidgetResult<()> {
        let location = self.component(id)?.location();
        self.set_bounds(id, Bounds::new(location.x, location.y, width, height))
    }

    pub fn set_location(&mut self, id: ComponentId, x: i32, y: i32) -> WidgetResult<()> {
        let size = self.component(id)?.size();
        self.set_bounds(id, Bounds::new(x, y, size.width, size.height))
    }

    /// Enable or disable a component.
    ///
    /// Disabling a component that holds focus (or contains the focused
    /// component) clears focus first.
    pub fn set_enabled(&mut self, id: ComponentId, enabled: bool) -> WidgetResult<()> {
        if self.component(id)?.enabled == enabled {
            return Ok(());
        }
        if !enabled && self.focused.is_some_and(|focused| self.is_ancestor_of(id, focused)) {
            self.clear_focus();
        }
        let component = self.component_mut(id)?;
        component.enabled = enabled;
        let listeners = component.listeners().state.snapshot();
        tracing::debug!(target: targets::COMPONENT, ?id, enabled, "enabled changed");

        self.notify_skin(id, SkinNotice::EnabledChanged);
        for listener in listeners {
            listener.enabled_changed(id);
        }
        Ok(())
    }

    /// Show or hide a component.
    pub fn set_visible(&mut self, id: ComponentId, visible: bool) -> WidgetResult<()> {
        if self.component(id)?.visible == visible {
            return Ok(());
        }
        if !visible && self.focused.is_some_and(|focused| self.is_ancestor_of(id, focused)) {
            self.clear_focus();
        }
        // Repaint while visible so the area the component covered is dirtied.
        if !visible {
            self.repaint(id);
        }
        let component = self.component_mut(id)?;
        component.visible = visible;
        let parent = component.parent;
        let listeners = component.listeners().state.snapshot();
        if visible {
            self.repaint(id);
        }
        if let Some(parent) = parent {
            self.invalidate(parent);
        }
        for listener in listeners {
            listener.visible_changed(id);
        }
        Ok(())
    }

    /// Whether the component and all its ancestors are visible.
    pub fn is_showing(&self, id: ComponentId) -> bool {
        let mut current = Some(id);
        while let Some(current_id) = current {
            match self.components.get(current_id) {
                Some(component) if component.visible => current = component.parent,
                _ => return false,
            }
        }
        true
    }

    /// Whether the component and all its ancestors are enabled.
    pub fn is_effectively_enabled(&self, id: ComponentId) -> bool {
        let mut current = Some(id);
        while let Some(current_id) = current {
            match self.components.get(current_id) {
                Some(component) if component.enabled => current = component.parent,
                _ => return false,
            }
        }
        true
    }

    // =========================================================================
    // Focus
    // =========================================================================

    /// The component holding keyboard focus.
    pub fn focused(&self) -> Option<ComponentId> {
        self.focused
    }

    /// Whether the component could take focus right now.
    pub fn can_focus(&self, id: ComponentId) -> bool {
        self.components.get(id).is_some_and(|c| c.focusable)
            && self.is_effectively_enabled(id)
            && self.is_showing(id)
    }

    /// Give a component keyboard focus.
    ///
    /// Returns whether the component holds focus afterwards.
    pub fn request_focus(&mut self, id: ComponentId) -> bool {
        if self.focused == Some(id) {
            return true;
        }
        if !self.can_focus(id) {
            tracing::trace!(target: targets::COMPONENT, ?id, "focus refused");
            return false;
        }
        self.clear_focus();
        self.set_focus_flag(id, true);
        true
    }

    /// Take focus away from whichever component holds it.
    pub fn clear_focus(&mut self) {
        if let Some(previous) = self.focused {
            self.set_focus_flag(previous, false);
        }
    }

    fn set_focus_flag(&mut self, id: ComponentId, focused: bool) {
        let Some(component) = self.components.get_mut(id) else {
            self.focused = None;
            return;
        };
        component.focused = focused;
        let listeners = component.listeners().state.snapshot();
        self.focused = focused.then_some(id);
        tracing::debug!(target: targets::COMPONENT, ?id, focused, "focus changed");

        self.notify_skin(id, SkinNotice::FocusedChanged);
        self.repaint(id);
        for listener in listeners {
            listener.focused_changed(id, focused);
        }
    }

    /// Move focus from `from` to the next (or previous) focusable component
    /// in tree order, wrapping around.
    ///
    /// Returns the component that received focus.
    pub fn transfer_focus(&mut self, from: ComponentId, direction: FocusDirection) -> Option<ComponentId> {
        let order: Vec<ComponentId> = self
            .roots
            .iter()
            .flat_map(|&root| self.descendants(root))
            .collect();
        let start = order.iter().position(|&id| id == from)?;
        let count = order.len();
        let target = (1..count)
            .map(|step| match direction {
                FocusDirection::Forward => order[(start + step) % count],
                FocusDirection::Backward => order[(start + count - step) % count],
            })
            .find(|&candidate| self.can_focus(candidate))?;
        self.request_focus(target).then_some(target)
    }

    // =========================================================================
    // Repaint and layout
    // =========================================================================

    /// Mark the whole component for repaint.
    pub fn repaint(&mut self, id: ComponentId) {
        if let Some(component) = self.components.get(id) {
            let area = Bounds::from_dimensions(component.size());
            self.repaint_area(id, area);
        }
    }

    /// Mark part of a component (in its own coordinates) for repaint.
    ///
    /// The area is clipped to the component, widened by its decorators, then
    /// clipped to each ancestor in turn and added to the tree's dirty region
    /// in display coordinates.
    /// Hidden components dirty nothing.
    pub fn repaint_area(&mut self, id: ComponentId, area: Bounds) {
        let mut current = id;
        let mut area = area;
        loop {
            let Some(component) = self.components.get(current) else {
                return;
            };
            if !component.visible {
                return;
            }
            let Some(clipped) = area.intersect(&Bounds::from_dimensions(component.size())) else {
                return;
            };
            area = clipped;
            for decorator in &component.decorators {
                area = decorator.affected_area(component, area);
            }
            area = area.translate(component.x(), component.y());
            match component.parent {
                Some(parent) => current = parent,
                None => break,
            }
        }
        self.mark_dirty(area);
    }

    fn mark_dirty(&mut self, area: Bounds) {
        if area.is_empty() {
            return;
        }
        let dirty = match self.dirty {
            Some(dirty) => dirty.union(&area),
            None => area,
        };
        tracing::trace!(target: targets::COMPONENT, ?area, ?dirty, "repaint requested");
        self.dirty = Some(dirty);
    }

    /// The accumulated dirty region in display coordinates.
    pub fn dirty_region(&self) -> Option<Bounds> {
        self.dirty
    }

    /// Take and reset the accumulated dirty region.
    pub fn take_dirty(&mut self) -> Option<Bounds> {
        self.dirty.take()
    }

    /// Mark a component's layout stale, along with its ancestors.
    pub fn invalidate(&mut self, id: ComponentId) {
        let mut current = Some(id);
        while let Some(current_id) = current {
            let Some(component) = self.components.get_mut(current_id) else {
                return;
            };
            component.valid = false;
            current = component.parent;
        }
    }

    /// Lay out every invalid component, parents before children.
    pub fn validate(&mut self) {
        let _span = tracing::trace_span!(span_names::LAYOUT).entered();
        let roots = self.roots.clone();
        for root in roots {
            self.validate_component(root);
        }
    }

    fn validate_component(&mut self, id: ComponentId) {
        let Some(component) = self.components.get(id) else {
            return;
        };
        if component.valid || !component.visible {
            return;
        }
        self.with_skin(id, |skin, host| skin.layout(host));
        if let Some(component) = self.components.get_mut(id) {
            component.valid = true;
        }
        let children = self.children(id).to_vec();
        for child in children {
            self.validate_component(child);
        }
    }

    /// Preferred size as reported by the component's skin.
    ///
    /// Components without a skin prefer their current size.
    pub fn preferred_size(&self, id: ComponentId) -> Dimensions {
        match self.view(id) {
            Some((view, Some(skin))) => skin.preferred_size(&view),
            Some((view, None)) => view.component.size(),
            None => Dimensions::ZERO,
        }
    }

    pub fn preferred_width(&self, id: ComponentId, height: Option<u32>) -> u32 {
        match self.view(id) {
            Some((view, Some(skin))) => skin.preferred_width(&view, height),
            Some((view, None)) => view.component.width(),
            None => 0,
        }
    }

    pub fn preferred_height(&self, id: ComponentId, width: Option<u32>) -> u32 {
        match self.view(id) {
            Some((view, Some(skin))) => skin.preferred_height(&view, width),
            Some((view, None)) => view.component.height(),
            None => 0,
        }
    }

    fn view(&self, id: ComponentId) -> Option<(TreeView<'_>, Option<&dyn Skin>)> {
        let component = self.components.get(id)?;
        Some((
            TreeView {
                tree: self,
                id,
                component,
            },
            component.skin(),
        ))
    }

    /// Resize a component to its preferred size.
    pub fn pack(&mut self, id: ComponentId) -> WidgetResult<()> {
        let size = self.preferred_size(id);
        self.set_size(id, size.width, size.height)
    }

    // =========================================================================
    // Painting
    // =========================================================================

    /// Paint every root onto `surface`.
    pub fn paint(&mut self, surface: &mut Surface) {
        let _span = tracing::trace_span!(span_names::PAINT).entered();
        let roots = self.roots.clone();
        for root in roots {
            self.paint_component(root, surface);
        }
    }

    /// Paint one component and its subtree through its decorator chain.
    ///
    /// `surface` must be positioned at the component's parent.
    pub fn paint_component(&mut self, id: ComponentId, surface: &mut Surface) {
        let Some(component) = self.components.get_mut(id) else {
            return;
        };
        if !component.visible {
            return;
        }
        let bounds = component.bounds;
        let mut decorators = std::mem::take(&mut component.decorators);

        surface.save();
        surface.translate(bounds.x, bounds.y);
        surface.clip_to(Bounds::from_dimensions(bounds.size()));
        if !surface.clip().is_empty()
            && let Some(component) = self.components.get(id)
        {
            let mut scratches = decorator::prepare_chain(&mut decorators, component, surface);
            self.paint_content(id, decorator::paint_target(&mut scratches, surface));
            decorator::update_chain(&mut decorators, scratches, surface);
        }
        surface.restore();

        if let Some(component) = self.components.get_mut(id) {
            component.decorators = decorators;
        }
    }

    fn paint_content(&mut self, id: ComponentId, surface: &mut Surface) {
        if let Some((view, Some(skin))) = self.view(id) {
            skin.paint(&view, surface);
        }
        let children = self.children(id).to_vec();
        for child in children {
            self.paint_component(child, surface);
        }
    }

    // =========================================================================
    // Geometry
    // =========================================================================

    /// The topmost visible child of `parent` containing the point (in
    /// `parent`'s coordinates).
    pub fn component_at(&self, parent: ComponentId, x: i32, y: i32) -> Option<ComponentId> {
        self.topmost_at(self.children(parent), x, y)
    }

    /// The deepest visible component under a display point.
    pub fn descendant_at(&self, x: i32, y: i32) -> Option<ComponentId> {
        let mut found = self.topmost_at(&self.roots, x, y)?;
        let mut point = self.components.get(found)?.location();
        let (mut x, mut y) = (x - point.x, y - point.y);
        while let Some(child) = self.component_at(found, x, y) {
            point = self.components.get(child)?.location();
            x -= point.x;
            y -= point.y;
            found = child;
        }
        Some(found)
    }

    fn topmost_at(&self, candidates: &[ComponentId], x: i32, y: i32) -> Option<ComponentId> {
        candidates.iter().rev().copied().find(|&id| {
            self.components
                .get(id)
                .is_some_and(|c| c.visible && c.bounds.contains(Point::new(x, y)))
        })
    }

    /// The component's top-left corner in display coordinates.
    pub fn location_on_display(&self, id: ComponentId) -> Option<Point> {
        let mut location = self.components.get(id)?.location();
        for ancestor in self.ancestors(id) {
            let offset = self.components.get(ancestor)?.location();
            location = location.offset(offset.x, offset.y);
        }
        Some(location)
    }

    /// Convert a display point into the component's coordinates.
    pub fn to_local(&self, id: ComponentId, point: Point) -> Option<Point> {
        let origin = self.location_on_display(id)?;
        Some(Point::new(point.x - origin.x, point.y - origin.y))
    }

    // =========================================================================
    // Deferred work
    // =========================================================================

    /// Apply finished background loads, then run queued tasks.
    pub fn process_tasks(&mut self) -> TaskReport {
        let mut report = TaskReport::default();
        for completed in self.loads.poll_completed() {
            self.apply_load(completed, &mut report);
        }
        let tasks = self.tasks.clone();
        report.tasks = tasks.run_pending(self);
        report
    }

    /// Block until every background load requested through this tree has
    /// finished or `timeout` elapses, then process tasks.
    pub fn finish_loads(&mut self, timeout: Duration) -> TaskReport {
        let deadline = Instant::now() + timeout;
        let mut report = TaskReport::default();
        while !self.pending_loads.is_empty() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.loads.wait_completed(remaining) {
                Some(completed) => self.apply_load(completed, &mut report),
                None => break,
            }
        }
        let rest = self.process_tasks();
        report.tasks = rest.tasks;
        report.images_applied += rest.images_applied;
        report.failures.extend(rest.failures);
        report
    }

    fn apply_load(&mut self, completed: CompletedLoad, report: &mut TaskReport) {
        let CompletedLoad { ticket, url, result } = completed;
        let target = self.pending_loads.remove(&ticket);
        match (result, target) {
            (Ok(image), Some(id)) => {
                self.resources.cache.put(url, image.clone());
                match self.set_image(id, Some(image)) {
                    Ok(()) => report.images_applied += 1,
                    Err(error) => report.failures.push((id, error)),
                }
            }
            (Ok(image), None) => {
                tracing::trace!(target: targets::COMPONENT, %url, "superseded image load cached");
                self.resources.cache.put(url, image);
            }
            (Err(error), Some(id)) => {
                tracing::warn!(target: targets::COMPONENT, ?id, %url, %error, "image load failed");
                report.failures.push((id, error.into()));
            }
            (Err(_), None) => {}
        }
    }
}

impl fmt::Debug for ComponentTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentTree")
            .field("components", &self.components.len())
            .field("roots", &self.roots)
            .field("focused", &self.focused)
            .field("dirty", &self.dirty)
            .field("tasks", &self.tasks)
            .field("pending_loads", &self.pending_loads.len())
            .finish()
    }
}

/// Read-only view of a component for painting and size queries.
pub(crate) struct TreeView<'a> {
    tree: &'a ComponentTree,
    id: ComponentId,
    component: &'a Component,
}

impl SkinView for TreeView<'_> {
    fn component_id(&self) -> ComponentId {
        self.id
    }

    fn component(&self) -> &Component {
        self.component
    }

    fn child(&self, child: ComponentId) -> Option<&Component> {
        self.tree
            .components
            .get(child)
            .filter(|c| c.parent == Some(self.id))
    }

    fn preferred_size_of(&self, child: ComponentId) -> Dimensions {
        self.tree.preferred_size(child)
    }
}

/// The [`SkinHost`] a skin receives while it handles a callback.
pub(crate) struct ComponentContext<'a> {
    tree: &'a mut ComponentTree,
    id: ComponentId,
}

impl SkinView for ComponentContext<'_> {
    fn component_id(&self) -> ComponentId {
        self.id
    }

    fn component(&self) -> &Component {
        // Skins cannot remove components, so the component outlives the context.
        &self.tree.components[self.id]
    }

    fn child(&self, child: ComponentId) -> Option<&Component> {
        self.tree
            .components
            .get(child)
            .filter(|c| c.parent == Some(self.id))
    }

    fn preferred_size_of(&self, child: ComponentId) -> Dimensions {
        self.tree.preferred_size(child)
    }
}

impl SkinHost for ComponentContext<'_> {
    fn repaint(&mut self) {
        self.tree.repaint(self.id);
    }

    fn repaint_area(&mut self, area: Bounds) {
        self.tree.repaint_area(self.id, area);
    }

    fn invalidate(&mut self) {
        self.tree.invalidate(self.id);
    }

    fn request_focus(&mut self) -> bool {
        self.tree.request_focus(self.id)
    }

    fn transfer_focus(&mut self, direction: FocusDirection) -> bool {
        self.tree.transfer_focus(self.id, direction).is_some()
    }

    fn press(&mut self) -> WidgetResult<()> {
        self.tree.press(self.id)
    }

    fn set_child_bounds(&mut self, child: ComponentId, bounds: Bounds) {
        if self.tree.parent(child) != Some(self.id) {
            tracing::warn!(target: targets::SKIN, parent = ?self.id, ?child, "not a child; bounds ignored");
            return;
        }
        if let Err(error) = self.tree.set_bounds(child, bounds) {
            tracing::warn!(target: targets::SKIN, ?child, %error, "unable to position child");
        }
    }

    fn post_task(&mut self, task: TreeTask) {
        self.tree.tasks.post(task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decorator::BlurDecorator;
    use crate::input::{Key, KeyboardModifiers};
    use crate::listener::ComponentStateListener;
    use crate::skin::{BoxPaneSkin, Orientation, PanelSkin, TerraPushButtonSkin};
    use crate::widgets::{Button, ButtonState, Panel};
    use std::cell::RefCell;
    use std::rc::Rc;
    use trellis_render::Color;

    fn panel(tree: &mut ComponentTree, bounds: Bounds) -> ComponentId {
        let id = tree.insert(Component::new(Panel).with_bounds(bounds));
        tree.set_skin(id, PanelSkin::new()).unwrap();
        id
    }

    fn button(tree: &mut ComponentTree, parent: ComponentId, label: &str) -> ComponentId {
        let id = tree
            .insert_child(parent, Component::new(Button::new(label)).with_size(40, 20))
            .unwrap();
        tree.set_skin(id, TerraPushButtonSkin::new()).unwrap();
        id
    }

    #[test]
    fn test_structure() {
        let mut tree = ComponentTree::new();
        let root = panel(&mut tree, Bounds::new(0, 0, 100, 100));
        let inner = tree.insert_child(root, Component::new(Panel)).unwrap();
        let leaf = tree.insert_child(inner, Component::new(())).unwrap();

        assert_eq!(tree.roots(), &[root]);
        assert_eq!(tree.children(root), &[inner]);
        assert_eq!(tree.ancestors(leaf), vec![inner, root]);
        assert_eq!(tree.descendants(root), vec![root, inner, leaf]);

        assert!(tree.add_child(leaf, root).is_err());
        assert!(tree.add_child(inner, inner).is_err());

        tree.add_child(root, leaf).unwrap();
        assert_eq!(tree.children(root), &[inner, leaf]);
        assert!(tree.children(inner).is_empty());

        tree.remove(inner).unwrap();
        assert!(!tree.contains(inner));
        assert_eq!(tree.len(), 2);
        assert!(matches!(
            tree.remove(inner),
            Err(WidgetError::ComponentNotFound(_))
        ));
    }

    #[test]
    fn test_set_skin_type_checks_and_restores_previous() {
        let mut tree = ComponentTree::new();
        let id = tree.insert(Component::new(Panel));
        tree.set_skin(id, PanelSkin::new()).unwrap();

        let err = tree.set_skin(id, TerraPushButtonSkin::new()).err().unwrap();
        assert!(matches!(err, WidgetError::TypeMismatch { .. }));
        assert!(tree.skin_as::<PanelSkin>(id).is_ok());
        assert_eq!(tree.skin(id).and_then(|skin| skin.component()), Some(id));

        let previous = tree.set_skin(id, BoxPaneSkin::default()).unwrap();
        assert!(previous.is_some_and(|skin| skin.component().is_none()));
    }

    #[test]
    fn test_focus_and_transfer() {
        let mut tree = ComponentTree::new();
        let root = panel(&mut tree, Bounds::new(0, 0, 200, 50));
        let a = button(&mut tree, root, "a");
        let b = button(&mut tree, root, "b");
        let c = button(&mut tree, root, "c");

        assert!(!tree.request_focus(root));
        assert!(tree.request_focus(a));
        assert!(tree.get(a).unwrap().is_focused());

        assert_eq!(tree.transfer_focus(a, FocusDirection::Forward), Some(b));
        assert!(!tree.get(a).unwrap().is_focused());
        tree.set_enabled(c, false).unwrap();
        assert_eq!(tree.transfer_focus(b, FocusDirection::Forward), Some(a));
        assert_eq!(tree.transfer_focus(a, FocusDirection::Backward), Some(b));

        tree.set_enabled(b, false).unwrap();
        assert_eq!(tree.focused(), None);
    }

    #[test]
    fn test_tab_key_through_skin_moves_focus() {
        let mut tree = ComponentTree::new();
        let root = panel(&mut tree, Bounds::new(0, 0, 200, 50));
        let a = button(&mut tree, root, "a");
        let b = button(&mut tree, root, "b");
        tree.request_focus(a);

        let consumed = tree
            .with_skin(a, |skin, host| skin.key_pressed(host, Key::Tab, KeyboardModifiers::NONE))
            .unwrap();
        assert!(consumed);
        assert_eq!(tree.focused(), Some(b));
        // The notice queued while a's skin was busy reached it on check-in.
        assert!(!tree.skin_as::<TerraPushButtonSkin>(a).unwrap().behavior().is_pressed());
    }

    #[test]
    fn test_space_release_presses_toggle_once() {
        let mut tree = ComponentTree::new();
        let id = tree.insert(Component::new(Button::toggle("t")).with_size(30, 20));
        tree.set_skin(id, TerraPushButtonSkin::new()).unwrap();

        tree.with_skin(id, |skin, host| {
            skin.key_pressed(host, Key::Space, KeyboardModifiers::NONE);
            skin.key_released(host, Key::Space, KeyboardModifiers::NONE);
        });
        assert_eq!(tree.model::<Button>(id).unwrap().state(), ButtonState::Selected);
        assert!(tree.skin(id).is_some());
    }

    #[test]
    fn test_repaint_accumulates_in_display_coordinates() {
        let mut tree = ComponentTree::new();
        let root = panel(&mut tree, Bounds::new(10, 10, 100, 100));
        let child = tree
            .insert_child(root, Component::new(()).with_bounds(Bounds::new(5, 5, 20, 20)))
            .unwrap();
        tree.take_dirty();

        tree.repaint_area(child, Bounds::new(0, 0, 4, 4));
        assert_eq!(tree.take_dirty(), Some(Bounds::new(15, 15, 4, 4)));

        // Clipped to the component.
        tree.repaint_area(child, Bounds::new(18, 18, 10, 10));
        assert_eq!(tree.take_dirty(), Some(Bounds::new(33, 33, 2, 2)));

        tree.set_visible(child, false).unwrap();
        tree.take_dirty();
        tree.repaint(child);
        assert_eq!(tree.dirty_region(), None);
    }

    #[test]
    fn test_validate_lays_out_box_pane() {
        let mut tree = ComponentTree::new();
        let root = tree.insert(Component::new(Panel).with_size(200, 30));
        tree.set_skin(root, BoxPaneSkin::new(Orientation::Horizontal).with_spacing(5))
            .unwrap();
        let a = button(&mut tree, root, "ab");
        let b = button(&mut tree, root, "abc");

        tree.validate();
        let a_bounds = tree.get(a).unwrap().bounds();
        let b_bounds = tree.get(b).unwrap().bounds();
        let a_width = tree.preferred_width(a, None);
        assert_eq!(a_bounds, Bounds::new(0, 0, a_width, 30));
        assert_eq!(b_bounds.x, a_width as i32 + 5);
        assert!(tree.get(root).unwrap().is_valid());

        let preferred = tree.preferred_size(root);
        assert_eq!(preferred.width, a_width + 5 + tree.preferred_width(b, None));
    }

    #[test]
    fn test_hit_testing() {
        let mut tree = ComponentTree::new();
        let root = panel(&mut tree, Bounds::new(10, 10, 100, 100));
        let under = tree
            .insert_child(root, Component::new(Panel).with_bounds(Bounds::new(0, 0, 50, 50)))
            .unwrap();
        let over = tree
            .insert_child(root, Component::new(()).with_bounds(Bounds::new(20, 20, 10, 10)))
            .unwrap();

        assert_eq!(tree.descendant_at(35, 35), Some(over));
        assert_eq!(tree.descendant_at(12, 12), Some(under));
        assert_eq!(tree.descendant_at(100, 100), Some(root));
        assert_eq!(tree.descendant_at(0, 0), None);
        assert_eq!(tree.location_on_display(over), Some(Point::new(30, 30)));
        assert_eq!(tree.to_local(over, Point::new(31, 32)), Some(Point::new(1, 2)));
    }

    #[test]
    fn test_paint_with_and_without_decorators() {
        let mut plain = ComponentTree::new();
        let root = plain.insert(Component::new(Panel).with_bounds(Bounds::new(2, 2, 8, 8)));
        plain
            .set_skin(root, PanelSkin::new().with_background_color(Color::RED))
            .unwrap();
        let mut surface = Surface::new(12, 12);
        plain.paint(&mut surface);
        assert_eq!(surface.pixel(5, 5), Some(Color::RED));
        assert_eq!(surface.pixel(1, 1), Some(Color::TRANSPARENT));

        plain.add_decorator(root, BlurDecorator::new(3).unwrap()).unwrap();
        let mut blurred = Surface::new(12, 12);
        plain.paint(&mut blurred);
        // A uniform fill blurs to itself.
        assert_eq!(blurred, surface);
        assert_eq!(plain.get(root).unwrap().decorators().len(), 1);
        assert!(plain.remove_decorator(root, 1).is_err());
        assert!(plain.remove_decorator(root, 0).is_ok());
    }

    #[derive(Default)]
    struct StateLog(RefCell<Vec<String>>);

    impl ComponentStateListener for StateLog {
        fn enabled_changed(&self, _component: ComponentId) {
            self.0.borrow_mut().push("enabled".into());
        }

        fn focused_changed(&self, _component: ComponentId, focused: bool) {
            self.0.borrow_mut().push(format!("focused {focused}"));
        }
    }

    #[test]
    fn test_state_listeners() {
        let mut tree = ComponentTree::new();
        let root = panel(&mut tree, Bounds::new(0, 0, 100, 100));
        let id = button(&mut tree, root, "x");
        let log = Rc::new(StateLog::default());
        let handle: Rc<dyn ComponentStateListener> = log.clone();
        tree.get(id).unwrap().listeners().state.add(&handle);

        tree.request_focus(id);
        tree.set_enabled(id, false).unwrap();
        tree.set_enabled(id, false).unwrap();
        assert_eq!(
            *log.0.borrow(),
            vec!["focused true", "focused false", "enabled"]
        );
    }

    #[test]
    fn test_tasks_run_against_tree() {
        let mut tree = ComponentTree::new();
        let id = tree.insert(Component::new(Button::toggle("t")));
        tree.tasks().post(move |tree: &mut ComponentTree| {
            tree.press(id).unwrap();
        });
        let report = tree.process_tasks();
        assert_eq!(report.tasks, 1);
        assert!(tree.model::<Button>(id).unwrap().is_selected());
    }
}
