//! The default file browser skin.
//!
//! Lists the browser's folder one entry per row, folders first, then files
//! that pass the browser's filter. Both groups are sorted by name, ignoring
//! case. Clicking a file selects it; double-clicking a folder opens it.

use std::fs;
use std::path::{Path, PathBuf};

use trellis_core::logging::targets;
use trellis_render::{Bounds, Color, Surface};

use super::push_button::{GLYPH_WIDTH, label_width, paint_label};
use super::{
    ComponentStateObserver, ConstrainedVisual, KeyInput, PointerInput, Skin, SkinBase, SkinHost,
    SkinView, Visual, check_model,
};
use crate::component::{Component, ComponentId};
use crate::error::WidgetResult;
use crate::input::MouseButton;
use crate::tree::ComponentTree;
use crate::widgets::FileBrowser;

/// Height of one listing row, in pixels.
pub const ROW_HEIGHT: u32 = 18;

const ICON_SIZE: u32 = 10;
const TEXT_INDENT: u32 = 20;

/// One row of a file browser listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    path: PathBuf,
    name: String,
    folder: bool,
}

impl FileEntry {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_folder(&self) -> bool {
        self.folder
    }
}

fn list_folder(browser: &FileBrowser) -> Vec<FileEntry> {
    let folder = browser.selected_folder();
    let reader = match fs::read_dir(folder) {
        Ok(reader) => reader,
        Err(error) => {
            tracing::warn!(
                target: targets::SKIN,
                folder = %folder.display(),
                %error,
                "unable to list folder"
            );
            return Vec::new();
        }
    };

    let mut entries: Vec<FileEntry> = reader
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let path = entry.path();
            let folder = path.is_dir();
            if !folder && !browser.includes(&path) {
                return None;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            Some(FileEntry { path, name, folder })
        })
        .collect();
    entries.sort_by(|a, b| {
        b.folder
            .cmp(&a.folder)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
            .then_with(|| a.name.cmp(&b.name))
    });
    entries
}

/// Row-based file browser look.
#[derive(Debug, Clone)]
pub struct TerraFileBrowserSkin {
    base: SkinBase,
    entries: Vec<FileEntry>,
    background_color: Color,
    color: Color,
    selection_background_color: Color,
    selection_color: Color,
    folder_color: Color,
    file_color: Color,
}

impl Default for TerraFileBrowserSkin {
    fn default() -> Self {
        Self::new()
    }
}

impl TerraFileBrowserSkin {
    pub fn new() -> Self {
        Self {
            base: SkinBase::new(),
            entries: Vec::new(),
            background_color: Color::WHITE,
            color: Color::BLACK,
            selection_background_color: Color::from_rgb8(0x14, 0x53, 0x8B),
            selection_color: Color::WHITE,
            folder_color: Color::from_rgb8(0xE8, 0xC5, 0x4A),
            file_color: Color::from_rgb8(0xB0, 0xB0, 0xB0),
        }
    }

    pub fn with_selection_background_color(mut self, color: Color) -> Self {
        self.selection_background_color = color;
        self
    }

    /// The current listing, in display order.
    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    /// The entry under a y coordinate.
    pub fn entry_at(&self, y: i32) -> Option<&FileEntry> {
        if y < 0 {
            return None;
        }
        self.entries.get(y as usize / ROW_HEIGHT as usize)
    }

    fn refresh(&mut self, component: &Component) {
        if let Ok(browser) = component.model::<FileBrowser>() {
            self.entries = list_folder(browser);
            tracing::trace!(
                target: targets::SKIN,
                folder = %browser.selected_folder().display(),
                entries = self.entries.len(),
                "folder listed"
            );
        }
    }
}

impl Visual for TerraFileBrowserSkin {
    fn paint(&self, view: &dyn SkinView, surface: &mut Surface) {
        let width = view.width();
        surface.fill_rect(Bounds::new(0, 0, width, view.height()), self.background_color);
        let Ok(browser) = view.component().model::<FileBrowser>() else {
            return;
        };

        let mut y = 0i32;
        for entry in &self.entries {
            if y >= view.height() as i32 {
                break;
            }
            let selected = !entry.folder && browser.is_file_selected(&entry.path);
            let text_color = if selected {
                surface.fill_rect(Bounds::new(0, y, width, ROW_HEIGHT), self.selection_background_color);
                self.selection_color
            } else {
                self.color
            };

            let icon_color = if entry.folder {
                self.folder_color
            } else {
                self.file_color
            };
            let inset = ((ROW_HEIGHT - ICON_SIZE) / 2) as i32;
            surface.fill_rect(Bounds::new(inset, y + inset, ICON_SIZE, ICON_SIZE), icon_color);
            paint_label(surface, &entry.name, TEXT_INDENT as i32, y + 2, text_color);

            y += ROW_HEIGHT as i32;
        }
    }
}

impl ConstrainedVisual for TerraFileBrowserSkin {
    fn preferred_width(&self, _view: &dyn SkinView, _height: Option<u32>) -> u32 {
        let widest = self
            .entries
            .iter()
            .map(|entry| label_width(&entry.name))
            .max()
            .unwrap_or(0);
        TEXT_INDENT + widest + GLYPH_WIDTH
    }

    fn preferred_height(&self, _view: &dyn SkinView, _width: Option<u32>) -> u32 {
        self.entries.len() as u32 * ROW_HEIGHT
    }
}

impl PointerInput for TerraFileBrowserSkin {
    fn mouse_click(&mut self, host: &mut dyn SkinHost, button: MouseButton, _x: i32, y: i32, count: u32) {
        if button != MouseButton::Left {
            return;
        }
        let Some(entry) = self.entry_at(y) else {
            return;
        };
        let id = host.component_id();
        let path = entry.path.clone();

        if entry.folder {
            if count == 2 {
                host.post_task(Box::new(move |tree: &mut ComponentTree| {
                    if let Err(error) = tree.set_selected_folder(id, path) {
                        tracing::warn!(target: targets::SKIN, %error, "unable to open folder");
                    }
                }));
            }
            return;
        }

        host.post_task(Box::new(move |tree: &mut ComponentTree| {
            let mode = tree
                .model::<FileBrowser>(id)
                .map(|browser| (browser.is_multi_select(), browser.is_file_selected(&path)));
            // Multi-select toggles the clicked file; single select replaces.
            let result = match mode {
                Ok((true, true)) => tree.remove_selected_file(id, &path).map(|_| ()),
                Ok((true, false)) => tree.add_selected_file(id, path).map(|_| ()),
                Ok((false, _)) => tree.set_selected_files(id, vec![path]),
                Err(error) => Err(error),
            };
            if let Err(error) = result {
                tracing::warn!(target: targets::SKIN, %error, "unable to select file");
            }
        }));
    }
}

impl KeyInput for TerraFileBrowserSkin {}

impl ComponentStateObserver for TerraFileBrowserSkin {
    fn model_changed(&mut self, host: &mut dyn SkinHost) {
        self.refresh(host.component());
        host.invalidate();
        host.repaint();
    }
}

impl Skin for TerraFileBrowserSkin {
    fn install(&mut self, id: ComponentId, component: &Component) -> WidgetResult<()> {
        check_model::<FileBrowser>(component)?;
        self.base.install(id);
        self.refresh(component);
        Ok(())
    }

    fn uninstall(&mut self) {
        self.entries.clear();
        self.base.uninstall();
    }

    fn component(&self) -> Option<ComponentId> {
        self.base.component()
    }
}
