//! File browsers.
//!
//! A [`FileBrowser`] shows the contents of one folder and keeps an ordered
//! selection of files in that folder. Every selected file must live directly
//! in the selected folder, and unless multi-select is on the selection holds
//! at most one file.

use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use trellis_core::ListenerList;
use trellis_core::logging::targets;

use crate::component::ComponentId;
use crate::error::{WidgetError, WidgetResult};
use crate::skin::SkinNotice;
use crate::tree::ComponentTree;

/// Decides which files a browser lists.
///
/// Folders are always listed.
pub trait FileFilter {
    fn include(&self, path: &Path) -> bool;
}

impl<F> FileFilter for F
where
    F: Fn(&Path) -> bool,
{
    fn include(&self, path: &Path) -> bool {
        self(path)
    }
}

/// Notified when a file browser's folder, selection or filter changes.
pub trait FileBrowserListener {
    fn selected_folder_changed(&self, _browser: ComponentId, _previous: &Path) {}

    fn selected_file_added(&self, _browser: ComponentId, _file: &Path) {}

    fn selected_file_removed(&self, _browser: ComponentId, _file: &Path) {}

    fn selected_files_changed(&self, _browser: ComponentId, _previous: &[PathBuf]) {}

    fn file_filter_changed(&self, _browser: ComponentId) {}
}

/// Model of a file browser.
pub struct FileBrowser {
    folder: PathBuf,
    selected: Vec<PathBuf>,
    multi_select: bool,
    filter: Option<Rc<dyn FileFilter>>,
    listeners: ListenerList<dyn FileBrowserListener>,
}

impl FileBrowser {
    /// Create a browser showing `folder`, which must be an existing directory.
    pub fn new(folder: impl Into<PathBuf>) -> WidgetResult<Self> {
        let folder = folder.into();
        check_folder(&folder)?;
        Ok(Self {
            folder,
            selected: Vec::new(),
            multi_select: false,
            filter: None,
            listeners: ListenerList::new(),
        })
    }

    pub fn with_multi_select(mut self, multi_select: bool) -> Self {
        self.multi_select = multi_select;
        self
    }

    pub fn with_file_filter(mut self, filter: impl FileFilter + 'static) -> Self {
        self.filter = Some(Rc::new(filter));
        self
    }

    pub fn selected_folder(&self) -> &Path {
        &self.folder
    }

    /// Selected files in selection order.
    pub fn selected_files(&self) -> &[PathBuf] {
        &self.selected
    }

    /// The single selected file, if exactly one is selected.
    pub fn selected_file(&self) -> Option<&Path> {
        match self.selected.as_slice() {
            [file] => Some(file),
            _ => None,
        }
    }

    pub fn is_file_selected(&self, file: &Path) -> bool {
        self.selected.iter().any(|selected| selected == file)
    }

    #[inline]
    pub fn is_multi_select(&self) -> bool {
        self.multi_select
    }

    pub fn file_filter(&self) -> Option<&Rc<dyn FileFilter>> {
        self.filter.as_ref()
    }

    /// Whether the filter lets `path` through.
    pub fn includes(&self, path: &Path) -> bool {
        self.filter.as_ref().is_none_or(|filter| filter.include(path))
    }

    pub fn listeners(&self) -> &ListenerList<dyn FileBrowserListener> {
        &self.listeners
    }

    fn check_file(&self, file: &Path) -> WidgetResult<()> {
        if file.parent() != Some(self.folder.as_path()) {
            return Err(WidgetError::invalid(format!(
                "{} is not in {}",
                file.display(),
                self.folder.display()
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for FileBrowser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileBrowser")
            .field("folder", &self.folder)
            .field("selected", &self.selected)
            .field("multi_select", &self.multi_select)
            .field("filtered", &self.filter.is_some())
            .finish()
    }
}

fn check_folder(folder: &Path) -> WidgetResult<()> {
    if !folder.is_dir() {
        return Err(WidgetError::invalid(format!(
            "{} is not a folder",
            folder.display()
        )));
    }
    Ok(())
}

impl ComponentTree {
    /// Show another folder. The selection is cleared.
    pub fn set_selected_folder(&mut self, id: ComponentId, folder: impl Into<PathBuf>) -> WidgetResult<()> {
        let folder = folder.into();
        check_folder(&folder)?;
        let browser = self.model_mut::<FileBrowser>(id)?;
        if browser.folder == folder {
            return Ok(());
        }
        let previous_files = std::mem::take(&mut browser.selected);
        let previous = std::mem::replace(&mut browser.folder, folder);
        tracing::debug!(
            target: targets::COMPONENT,
            component = ?id,
            folder = %browser.folder.display(),
            "folder changed"
        );
        let listeners = browser.listeners.snapshot();
        for listener in &listeners {
            if !previous_files.is_empty() {
                listener.selected_files_changed(id, &previous_files);
            }
            listener.selected_folder_changed(id, &previous);
        }
        self.notify_skin(id, SkinNotice::ModelChanged);
        Ok(())
    }

    /// Add a file to the selection.
    ///
    /// Returns `false` when the file was already selected. Without
    /// multi-select the file replaces the current selection.
    pub fn add_selected_file(&mut self, id: ComponentId, file: impl Into<PathBuf>) -> WidgetResult<bool> {
        let file = file.into();
        let browser = self.model_mut::<FileBrowser>(id)?;
        browser.check_file(&file)?;
        if browser.is_file_selected(&file) {
            return Ok(false);
        }
        if !browser.multi_select && !browser.selected.is_empty() {
            self.set_selected_files(id, vec![file])?;
            return Ok(true);
        }
        browser.selected.push(file);
        let listeners = browser.listeners.snapshot();
        if let Some(added) = browser.selected.last() {
            for listener in listeners {
                listener.selected_file_added(id, added);
            }
        }
        self.notify_skin(id, SkinNotice::ModelChanged);
        Ok(true)
    }

    /// Remove a file from the selection. Returns whether it was selected.
    pub fn remove_selected_file(&mut self, id: ComponentId, file: &Path) -> WidgetResult<bool> {
        let browser = self.model_mut::<FileBrowser>(id)?;
        let Some(index) = browser.selected.iter().position(|selected| selected == file) else {
            return Ok(false);
        };
        let removed = browser.selected.remove(index);
        let listeners = browser.listeners.snapshot();
        for listener in listeners {
            listener.selected_file_removed(id, &removed);
        }
        self.notify_skin(id, SkinNotice::ModelChanged);
        Ok(true)
    }

    /// Replace the selection.
    ///
    /// Duplicates are dropped, keeping the first occurrence. More than one
    /// file requires multi-select.
    pub fn set_selected_files(&mut self, id: ComponentId, files: Vec<PathBuf>) -> WidgetResult<()> {
        let browser = self.model_mut::<FileBrowser>(id)?;
        let mut selection: Vec<PathBuf> = Vec::with_capacity(files.len());
        for file in files {
            browser.check_file(&file)?;
            if !selection.contains(&file) {
                selection.push(file);
            }
        }
        if !browser.multi_select && selection.len() > 1 {
            return Err(WidgetError::invalid(
                "multi-select is off; only one file can be selected",
            ));
        }
        if browser.selected == selection {
            return Ok(());
        }
        let previous = std::mem::replace(&mut browser.selected, selection);
        let listeners = browser.listeners.snapshot();
        for listener in listeners {
            listener.selected_files_changed(id, &previous);
        }
        self.notify_skin(id, SkinNotice::ModelChanged);
        Ok(())
    }

    pub fn clear_selection(&mut self, id: ComponentId) -> WidgetResult<()> {
        self.set_selected_files(id, Vec::new())
    }

    /// Turn multi-select on or off.
    ///
    /// Turning it off keeps only the first selected file.
    pub fn set_multi_select(&mut self, id: ComponentId, multi_select: bool) -> WidgetResult<()> {
        let browser = self.model_mut::<FileBrowser>(id)?;
        if browser.multi_select == multi_select {
            return Ok(());
        }
        if !multi_select && browser.selected.len() > 1 {
            let first = browser.selected[..1].to_vec();
            self.set_selected_files(id, first)?;
        }
        self.model_mut::<FileBrowser>(id)?.multi_select = multi_select;
        Ok(())
    }

    pub fn set_file_filter(&mut self, id: ComponentId, filter: Option<Rc<dyn FileFilter>>) -> WidgetResult<()> {
        let browser = self.model_mut::<FileBrowser>(id)?;
        let unchanged = match (&browser.filter, &filter) {
            (None, None) => true,
            (Some(current), Some(new)) => Rc::ptr_eq(current, new),
            _ => false,
        };
        if unchanged {
            return Ok(());
        }
        browser.filter = filter;
        let listeners = browser.listeners.snapshot();
        for listener in listeners {
            listener.file_filter_changed(id);
        }
        self.notify_skin(id, SkinNotice::ModelChanged);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Component;
    use std::cell::RefCell;
    use std::fs;

    #[derive(Default)]
    struct Recorder {
        events: RefCell<Vec<String>>,
    }

    impl FileBrowserListener for Recorder {
        fn selected_folder_changed(&self, _browser: ComponentId, _previous: &Path) {
            self.events.borrow_mut().push("folder".into());
        }

        fn selected_file_added(&self, _browser: ComponentId, file: &Path) {
            let name = file.file_name().unwrap().to_string_lossy().into_owned();
            self.events.borrow_mut().push(format!("added {name}"));
        }

        fn selected_file_removed(&self, _browser: ComponentId, file: &Path) {
            let name = file.file_name().unwrap().to_string_lossy().into_owned();
            self.events.borrow_mut().push(format!("removed {name}"));
        }

        fn selected_files_changed(&self, _browser: ComponentId, previous: &[PathBuf]) {
            self.events
                .borrow_mut()
                .push(format!("files changed from {}", previous.len()));
        }

        fn file_filter_changed(&self, _browser: ComponentId) {
            self.events.borrow_mut().push("filter".into());
        }
    }

    fn setup(multi_select: bool) -> (tempfile::TempDir, ComponentTree, ComponentId, Rc<Recorder>) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::write(dir.path().join("b.txt"), "b").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        let browser = FileBrowser::new(dir.path()).unwrap().with_multi_select(multi_select);
        let recorder = Rc::new(Recorder::default());
        let handle: Rc<dyn FileBrowserListener> = recorder.clone();
        browser.listeners().add(&handle);

        let mut tree = ComponentTree::new();
        let id = tree.insert(Component::new(browser));
        (dir, tree, id, recorder)
    }

    #[test]
    fn test_new_requires_folder() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        fs::write(&file, "x").unwrap();
        assert!(matches!(
            FileBrowser::new(&file),
            Err(WidgetError::InvalidArgument(_))
        ));
        assert!(FileBrowser::new(dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_multi_select_add_and_remove() {
        let (dir, mut tree, id, recorder) = setup(true);
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");

        assert!(tree.add_selected_file(id, &a).unwrap());
        assert!(tree.add_selected_file(id, &b).unwrap());
        assert!(!tree.add_selected_file(id, &a).unwrap());
        assert_eq!(
            tree.model::<FileBrowser>(id).unwrap().selected_files(),
            &[a.clone(), b.clone()]
        );

        assert!(tree.remove_selected_file(id, &a).unwrap());
        assert!(!tree.remove_selected_file(id, &a).unwrap());
        assert_eq!(
            *recorder.events.borrow(),
            vec!["added a.txt", "added b.txt", "removed a.txt"]
        );
    }

    #[test]
    fn test_single_select_replaces() {
        let (dir, mut tree, id, recorder) = setup(false);
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");

        tree.add_selected_file(id, &a).unwrap();
        tree.add_selected_file(id, &b).unwrap();
        let browser = tree.model::<FileBrowser>(id).unwrap();
        assert_eq!(browser.selected_file(), Some(b.as_path()));
        assert_eq!(
            *recorder.events.borrow(),
            vec!["added a.txt", "files changed from 1"]
        );

        assert!(matches!(
            tree.set_selected_files(id, vec![a, b]),
            Err(WidgetError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_file_outside_folder_rejected() {
        let (_dir, mut tree, id, _recorder) = setup(true);
        let elsewhere = tempfile::tempdir().unwrap();
        let stray = elsewhere.path().join("stray.txt");
        assert!(tree.add_selected_file(id, &stray).is_err());
        assert!(tree.set_selected_files(id, vec![stray]).is_err());
    }

    #[test]
    fn test_folder_change_clears_selection() {
        let (dir, mut tree, id, recorder) = setup(true);
        tree.add_selected_file(id, dir.path().join("a.txt")).unwrap();

        tree.set_selected_folder(id, dir.path().join("sub")).unwrap();
        let browser = tree.model::<FileBrowser>(id).unwrap();
        assert!(browser.selected_files().is_empty());
        assert_eq!(browser.selected_folder(), dir.path().join("sub"));
        assert_eq!(
            *recorder.events.borrow(),
            vec!["added a.txt", "files changed from 1", "folder"]
        );
        assert!(tree.set_selected_folder(id, dir.path().join("a.txt")).is_err());
    }

    #[test]
    fn test_disabling_multi_select_keeps_first() {
        let (dir, mut tree, id, _recorder) = setup(true);
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        tree.set_selected_files(id, vec![b.clone(), a, b.clone()]).unwrap();
        assert_eq!(tree.model::<FileBrowser>(id).unwrap().selected_files().len(), 2);

        tree.set_multi_select(id, false).unwrap();
        let browser = tree.model::<FileBrowser>(id).unwrap();
        assert!(!browser.is_multi_select());
        assert_eq!(browser.selected_files(), &[b]);
    }

    #[test]
    fn test_filter() {
        let (dir, mut tree, id, recorder) = setup(false);
        let filter: Rc<dyn FileFilter> =
            Rc::new(|path: &Path| path.extension().is_some_and(|ext| ext == "png"));
        tree.set_file_filter(id, Some(filter.clone())).unwrap();
        tree.set_file_filter(id, Some(filter)).unwrap();

        let browser = tree.model::<FileBrowser>(id).unwrap();
        assert!(!browser.includes(&dir.path().join("a.txt")));
        assert!(browser.includes(&dir.path().join("c.png")));
        assert_eq!(*recorder.events.borrow(), vec!["filter"]);
    }
}
