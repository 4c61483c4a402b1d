//! AUX bus protocol: identifiers, framing and payload packing.

mod frame;
mod ids;

pub use frame::{
    checksum, pack_int3_steps, unpack_int3_steps, AuxCommand, DecodedFrame, FrameBuffer, Payload,
    FRAME_OVERHEAD, MAX_FRAME, MAX_PAYLOAD, START_BYTE,
};
pub use ids::{CommandCode, DeviceId};
