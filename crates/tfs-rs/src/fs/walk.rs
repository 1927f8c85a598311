//! Absolute-path parsing and directory tree traversal.

use crate::disk::Disk;
use crate::error::{FsError, Result};
use crate::fs::chains;
use crate::layout::directory::Directory;
use crate::layout::fcb::Fcb;
use crate::layout::pcb::Pcb;

/// Splits an absolute path into its components. Paths start with `/`, do not
/// end with one, and contain no empty or whitespace-bearing components. `/`
/// alone is rejected here; listing handles it before parsing.
pub(crate) fn parse_path(path: &str) -> Result<Vec<String>> {
    if !path.starts_with('/') || path.ends_with('/') || path.len() < 2 {
        return Err(FsError::InvalidPath);
    }
    let mut components = Vec::new();
    for component in path[1..].split('/') {
        if component.is_empty() || component.chars().any(char::is_whitespace) {
            return Err(FsError::InvalidPath);
        }
        components.push(component.to_string());
    }
    Ok(components)
}

/// The directory holding a path's terminal component: the in-memory root for
/// single-component paths, otherwise a directory loaded from disk along with
/// the entry that locates it.
pub(crate) enum Parent {
    Root,
    Nested { dir: Directory, fcb: Fcb },
}

impl Parent {
    pub(crate) fn dir<'a>(&'a self, root: &'a Directory) -> &'a Directory {
        match self {
            Self::Root => root,
            Self::Nested { dir, .. } => dir,
        }
    }
}

/// Walks the interior components of `components`, loading each directory from
/// disk in turn.
///
/// # Errors
/// `PathNotFound` when an interior component is missing or not a directory.
pub(crate) fn locate_parent(
    disk: &Disk,
    pcb: &Pcb,
    root: &Directory,
    components: &[String],
) -> Result<Parent> {
    let mut current: Option<(Directory, Fcb)> = None;
    for component in &components[..components.len() - 1] {
        let dir = current.as_ref().map_or(root, |(d, _)| d);
        let fcb = dir
            .get(component, true)
            .ok_or(FsError::PathNotFound)?
            .clone();
        let next = chains::load_dir(disk, pcb, fcb.starting_block(), fcb.size())?;
        current = Some((next, fcb));
    }
    Ok(match current {
        None => Parent::Root,
        Some((dir, fcb)) => Parent::Nested { dir, fcb },
    })
}

/// Traversal state for mutating operations on multi-component paths: the
/// parent to edit, the entry locating it, and the loaded ancestor when the
/// parent sits deeper than one level (`None` means the root is the
/// ancestor).
pub(crate) struct WalkToParent {
    pub(crate) parent: Directory,
    pub(crate) parent_fcb: Fcb,
    pub(crate) ancestor: Option<(Directory, Fcb)>,
}

/// Like [`locate_parent`] but keeps the ancestor so entry-count changes in
/// the parent can be propagated. Only meaningful for paths of two or more
/// components.
///
/// # Errors
/// `PathNotFound` when an interior component is missing or not a directory.
pub(crate) fn walk_to_parent(
    disk: &Disk,
    pcb: &Pcb,
    root: &Directory,
    components: &[String],
) -> Result<WalkToParent> {
    let mut parent: Option<(Directory, Fcb)> = None;
    let mut ancestor: Option<(Directory, Fcb)> = None;
    for component in &components[..components.len() - 1] {
        let dir = parent.as_ref().map_or(root, |(d, _)| d);
        let fcb = dir
            .get(component, true)
            .ok_or(FsError::PathNotFound)?
            .clone();
        let next = chains::load_dir(disk, pcb, fcb.starting_block(), fcb.size())?;
        ancestor = parent.take();
        parent = Some((next, fcb));
    }
    let (parent, parent_fcb) = parent.ok_or(FsError::PathNotFound)?;
    Ok(WalkToParent {
        parent,
        parent_fcb,
        ancestor,
    })
}

/// After an entry was added to or removed from `parent`: writes the parent
/// back, then refreshes the byte size its container records for it. The
/// container's own size is unchanged by this edit, so the update stops
/// there.
pub(crate) fn store_parent_and_propagate(
    disk: &mut Disk,
    pcb: &mut Pcb,
    root: &mut Directory,
    components: &[String],
    walk: WalkToParent,
) -> Result<()> {
    let WalkToParent {
        parent,
        parent_fcb,
        ancestor,
    } = walk;
    chains::store_dir(disk, pcb, &parent, parent_fcb.starting_block())?;
    match ancestor {
        Some((mut ancestor_dir, ancestor_fcb)) => {
            let parent_name = &components[components.len() - 2];
            ancestor_dir.update_size(parent_name, parent.byte_size(), true)?;
            chains::store_dir(disk, pcb, &ancestor_dir, ancestor_fcb.starting_block())?;
        }
        None => {
            root.update_size(&components[0], parent.byte_size(), true)?;
            let root_block = pcb.root_dir_block();
            chains::store_dir(disk, pcb, root, root_block)?;
        }
    }
    Ok(())
}
