//! Action definitions for keyboard shortcuts.

// ============================================================================
// Global Actions - work in any context
// ============================================================================

pub mod global {
    use gpui::actions;

    actions!(
        global,
        [
            // Tab switching
            SwitchToTester,
            SwitchToQueryTemplates,
            SwitchToSchemaTemplates,
            // Catalog actions
            NewDatabase,
            RefreshAll,
            // Focus
            Escape,
        ]
    );
}

// ============================================================================
// Editor Actions - SQL editor specific
// ============================================================================

pub mod editor {
    use gpui::actions;

    actions!(
        editor,
        [
            ExecuteQuery,
            FormatQuery,
            SaveQuery,
            LoadQuery,
        ]
    );
}
