mod local_track;
mod media_devices;
mod synthetic;

pub use local_track::{LocalMediaStream, LocalTrack};
pub use media_devices::MediaDevices;
pub use synthetic::SyntheticDevices;
