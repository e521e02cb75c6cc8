use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// A cancellation scope shared by every task of a server. Each clone keeps
/// the scope alive; [`Handler::cancel`] resolves once all clones are gone.
#[derive(Clone)]
pub struct Context {
	token: CancellationToken,
	_alive: mpsc::Sender<()>,
}

pub struct Handler {
	token: CancellationToken,
	alive: mpsc::Receiver<()>,
}

impl Context {
	#[must_use]
	pub fn new() -> (Self, Handler) {
		let token = CancellationToken::new();
		let (alive_tx, alive_rx) = mpsc::channel(1);

		(
			Self {
				token: token.clone(),
				_alive: alive_tx,
			},
			Handler { token, alive: alive_rx },
		)
	}

	/// Resolves when the handler cancels the scope.
	pub fn done(&self) -> WaitForCancellationFuture<'_> {
		self.token.cancelled()
	}

	pub fn is_done(&self) -> bool {
		self.token.is_cancelled()
	}
}

impl Handler {
	/// Waits for every context to be dropped without cancelling.
	pub async fn done(&mut self) {
		while self.alive.recv().await.is_some() {}
	}

	/// Cancels the scope and waits for every context to be dropped.
	pub async fn cancel(mut self) {
		self.token.cancel();
		self.done().await;
	}
}
