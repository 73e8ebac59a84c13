pub mod build;
pub mod diagnostics;
pub mod signature_help;

use kestrel_lsp_core::CancellationToken;

/// Cancels its token when dropped, so that abandoning a request future
/// (for example on `$/cancelRequest`) stops the work it started.
pub struct CancelOnDrop(pub CancellationToken);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}
