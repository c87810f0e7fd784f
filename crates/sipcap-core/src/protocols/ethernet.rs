use etherparse::{Ethernet2HeaderSlice, SingleVlanHeaderSlice};

use crate::buffer::FrameBuffer;

use super::DecodeError;

pub const ETHER_TYPE_IPV4: u16 = 0x0800;
pub const ETHER_TYPE_802_1Q: u16 = 0x8100;
pub const ETHER_TYPE_802_1AD: u16 = 0x88a8;

pub const MAX_VLAN_TAGS: usize = 8;

/// Read the Ethernet header and return the EtherType, skipping any stacked
/// 802.1Q / 802.1AD tags. The cursor ends on the first byte of the payload.
///
/// # Examples
/// ```
/// use sipcap_core::buffer::FrameBuffer;
/// use sipcap_core::protocols::ethernet::{read_ether_type, ETHER_TYPE_IPV4};
///
/// let mut frame = vec![0u8; 12];
/// frame.extend_from_slice(&[0x08, 0x00]);
/// let mut buffer = FrameBuffer::new(frame);
/// assert_eq!(read_ether_type(&mut buffer).unwrap(), ETHER_TYPE_IPV4);
/// assert_eq!(buffer.position(), 14);
/// ```
pub fn read_ether_type(buffer: &mut FrameBuffer) -> Result<u16, DecodeError> {
    let header = Ethernet2HeaderSlice::from_slice(buffer.remaining_slice())?;
    let mut ether_type = header.ether_type().0;
    let header_length = header.slice().len();
    buffer.skip(header_length)?;

    let mut tags = 0;
    while is_vlan_tag(ether_type) {
        tags += 1;
        if tags > MAX_VLAN_TAGS {
            return Err(DecodeError::NestingTooDeep {
                layer: "VLAN tag",
                limit: MAX_VLAN_TAGS,
            });
        }
        let tag = SingleVlanHeaderSlice::from_slice(buffer.remaining_slice())?;
        let tag_length = tag.slice().len();
        ether_type = tag.ether_type().0;
        buffer.skip(tag_length)?;
    }
    Ok(ether_type)
}

fn is_vlan_tag(ether_type: u16) -> bool {
    ether_type == ETHER_TYPE_802_1Q || ether_type == ETHER_TYPE_802_1AD
}
