//! Drop targets exposed by strips in `ExternalDrag` mode.

/// Region of a foreign window under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropZone {
    /// Over the tab strip; the tab would be inserted at `insert_index`
    TabBar { insert_index: usize },
    /// Over the title bar; the tab would be appended
    WindowTitle,
    /// Anywhere else in the window; the tab would be appended
    EmptySpace,
}

/// Visual feedback a UI shell draws for the current drop target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropIndicator {
    /// Line before the tab at this index
    InsertBefore(usize),
    /// Line after the last tab
    InsertAfter(usize),
    /// Whole-window highlight: tab joins this window
    AttachWindow,
    /// Nothing under the pointer: a new window will open
    NewWindow,
}

impl DropZone {
    /// Index the tab lands at in a strip currently holding `tab_count` tabs.
    pub fn target_index(self, tab_count: usize) -> usize {
        match self {
            DropZone::TabBar { insert_index } => insert_index.min(tab_count),
            DropZone::WindowTitle | DropZone::EmptySpace => tab_count,
        }
    }

    pub fn indicator(self, tab_count: usize) -> DropIndicator {
        match self {
            DropZone::TabBar { insert_index } if insert_index < tab_count => {
                DropIndicator::InsertBefore(insert_index)
            }
            DropZone::TabBar { .. } => DropIndicator::InsertAfter(tab_count.saturating_sub(1)),
            DropZone::WindowTitle | DropZone::EmptySpace => DropIndicator::AttachWindow,
        }
    }
}
