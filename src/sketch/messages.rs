/// Notifications the session publishes for whoever renders it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SketchEvent {
    /// The surface pixels changed and should be re-uploaded.
    Repaint,
    HistoryChanged { can_undo: bool, can_redo: bool },
    BackgroundFailed { name: String, error: String },
    /// A history snapshot could not be decoded; the surface was blanked.
    RestoreFailed { error: String },
}
