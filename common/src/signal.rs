use futures::future::select_all;
use tokio::signal::unix::{signal, Signal, SignalKind};

/// Listens on a set of unix signals and reports whichever arrives first.
#[derive(Default)]
pub struct SignalHandler {
	signals: Vec<(SignalKind, Signal)>,
}

impl SignalHandler {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_signal(mut self, kind: SignalKind) -> std::io::Result<Self> {
		self.signals.push((kind, signal(kind)?));
		Ok(self)
	}

	/// Pending forever when no signals were registered.
	pub async fn recv(&mut self) -> SignalKind {
		if self.signals.is_empty() {
			return std::future::pending().await;
		}

		let waiting = self
			.signals
			.iter_mut()
			.map(|(kind, signal)| {
				let kind = *kind;
				Box::pin(async move {
					signal.recv().await;
					kind
				})
			})
			.collect::<Vec<_>>();

		select_all(waiting).await.0
	}
}
