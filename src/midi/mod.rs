pub mod device;
pub mod event;
pub mod output;

pub use device::{MidiDeviceInfo, OutputDeviceManager};
pub use event::{MessageKind, MidiMessage};
pub use output::{MemoryTransport, MidirTransport, SentMessage, Transport, TransportError};
