//! Single-writer, last-value-wins price cell

use rust_decimal::Decimal;
use tokio::sync::watch;

/// Create a price cell. The writer is not `Clone`, so only one path can
/// publish; readers are cheap to clone and always see the newest value.
pub fn latest_price() -> (PriceWriter, PriceReader) {
    let (tx, rx) = watch::channel(None);
    (PriceWriter { tx }, PriceReader { rx })
}

/// Publishing half of the price cell
#[derive(Debug)]
pub struct PriceWriter {
    tx: watch::Sender<Option<Decimal>>,
}

impl PriceWriter {
    /// Overwrite the stored price
    pub fn publish(&self, price: Decimal) {
        self.tx.send_replace(Some(price));
    }

    /// A new reader attached to this cell
    pub fn reader(&self) -> PriceReader {
        PriceReader {
            rx: self.tx.subscribe(),
        }
    }
}

/// Reading half of the price cell
#[derive(Debug, Clone)]
pub struct PriceReader {
    rx: watch::Receiver<Option<Decimal>>,
}

impl PriceReader {
    /// Most recently published price, if any tick has arrived yet
    pub fn get(&self) -> Option<Decimal> {
        *self.rx.borrow()
    }
}
