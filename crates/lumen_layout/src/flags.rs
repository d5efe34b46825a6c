//! Widget state, ability and scene invalidation flag sets

bitflags::bitflags! {
    /// Interaction state of a widget
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct StateFlags: u16 {
        const HOVERED = 1 << 0;
        const FOCUSED = 1 << 1;
        /// Pressed
        const ACTIVE = 1 << 2;
        const SELECTED = 1 << 3;
        const DRAGGING = 1 << 4;
        const SLIDING = 1 << 5;
        const READ_ONLY = 1 << 6;
        const DISABLED = 1 << 7;
        const INVISIBLE = 1 << 8;
        const LONG_HOVERED = 1 << 9;
        const CHECKED = 1 << 10;
        /// Hidden from code. Survives restyles and implies `INVISIBLE`.
        const HIDDEN = 1 << 11;
    }
}

bitflags::bitflags! {
    /// What a widget can do, consulted by the event router
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Abilities: u16 {
        const ACTIVATABLE = 1 << 0;
        const FOCUSABLE = 1 << 1;
        const HOVERABLE = 1 << 2;
        const SLIDEABLE = 1 << 3;
        const PRESSABLE = 1 << 4;
        const CHECKABLE = 1 << 5;
        const LONG_HOVERABLE = 1 << 6;
        const LONG_PRESSABLE = 1 << 7;
        const SCROLLABLE = 1 << 8;
        const DRAGGABLE = 1 << 9;
        const DROPPABLE = 1 << 10;

        /// Anything that takes part in a press gesture
        const PRESS_TARGET = Self::ACTIVATABLE.bits()
            | Self::PRESSABLE.bits()
            | Self::CHECKABLE.bits()
            | Self::SLIDEABLE.bits()
            | Self::DRAGGABLE.bits()
            | Self::LONG_PRESSABLE.bits();
    }
}

bitflags::bitflags! {
    /// Work a scene owes before its next frame
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct SceneNeeds: u8 {
        const STYLE = 1 << 0;
        const LAYOUT = 1 << 1;
        const RENDER = 1 << 2;
        /// Full restyle of every widget
        const REBUILD = 1 << 3;
        /// Scroll offsets changed; bounding boxes need recomputing
        const POSITION = 1 << 4;
    }
}
