//! Integration tests for knx-wire
//!
//! These tests drive complete KNXnet/IP frames through the public API: build
//! a frame, hand it to the peer (a loopback UDP socket for discovery), parse
//! it back and inspect the typed result.

use std::net::{Ipv4Addr, SocketAddrV4, UdpSocket};
use std::time::Duration;

use knx_wire::protocol::cemi::{LDataFrame, Message};
use knx_wire::protocol::constants::ServiceType;
use knx_wire::protocol::description::{DescriptorBlock, ScanNote};
use knx_wire::protocol::dib::{
    DeviceInfo, FriendlyName, KnxMedium, ServiceFamily, ServiceFamilyType, SupportedServices,
};
use knx_wire::protocol::frame::{encode_frame, HostInfo, KnxnetIpFrame};
use knx_wire::protocol::services::{
    ConnectionHeader, DescriptionResponse, DiagnosticRequest, DiagnosticResponse, SearchRequest,
    SearchResponse, Selector, TunnelAck, TunnelRequest,
};
use knx_wire::protocol::tpdu::{Apci, ApplicationUnit};
use knx_wire::{ga, ia, Decode, Encode, GroupAddress, IndividualAddress};

const TEST_TIMEOUT: Duration = Duration::from_secs(3);

/// Helper to create a loopback UDP socket for testing
fn create_test_socket() -> std::io::Result<UdpSocket> {
    let socket = UdpSocket::bind("127.0.0.1:0")?;
    socket.set_read_timeout(Some(TEST_TIMEOUT))?;
    socket.set_write_timeout(Some(TEST_TIMEOUT))?;
    Ok(socket)
}

/// Helper to get the bound IPv4 address of a socket
fn local_v4(socket: &UdpSocket) -> SocketAddrV4 {
    match socket.local_addr().unwrap() {
        std::net::SocketAddr::V4(addr) => addr,
        std::net::SocketAddr::V6(_) => panic!("expected an IPv4 socket"),
    }
}

/// Helper to build the description of a gateway
fn gateway_description() -> DescriptorBlock {
    let mut families = heapless::Vec::new();
    families.push(ServiceFamily::new(ServiceFamilyType::IpCore, 2)).unwrap();
    families.push(ServiceFamily::new(ServiceFamilyType::Tunnelling, 1)).unwrap();

    DescriptorBlock {
        device_info: Some(DeviceInfo {
            medium: KnxMedium::Tp1,
            status: 0x01,
            source: ia!(1, 1, 0),
            project_id: 0x0001,
            serial_number: [0x00, 0xFA, 0x12, 0x34, 0x56, 0x78],
            multicast_address: [224, 0, 23, 12],
            mac_address: [0x00, 0x24, 0x6D, 0x01, 0x02, 0x03],
            friendly_name: FriendlyName::try_from("KNX IP Router").unwrap(),
        }),
        supported_services: Some(SupportedServices { families }),
        ..DescriptorBlock::default()
    }
}

#[test]
fn test_search_over_loopback() {
    println!("\n=== Test: Search Over Loopback ===");

    let client = create_test_socket().expect("Failed to create client socket");
    let server = create_test_socket().expect("Failed to create server socket");
    println!("✓ Sockets created: {} / {}", local_v4(&client), local_v4(&server));

    // Client announces where the response should go
    let request = SearchRequest::new(HostInfo::from(local_v4(&client)));
    let mut buffer = [0u8; 1024];
    let len = encode_frame(&request, &mut buffer).unwrap();
    client.send_to(&buffer[..len], local_v4(&server)).unwrap();
    println!("✓ SEARCH_REQUEST sent ({} bytes)", len);

    // Server parses the request and answers on the announced endpoint
    let (len, _) = server.recv_from(&mut buffer).expect("No SEARCH_REQUEST received");
    let frame = KnxnetIpFrame::parse(&buffer[..len]).unwrap();
    assert_eq!(frame.service_type(), Some(ServiceType::SearchRequest));
    let received = frame.decode_body::<SearchRequest>().unwrap();
    assert_eq!(received, request);
    println!("✓ SEARCH_REQUEST parsed, reply to {}", received.endpoint.socket_addr());

    let response = SearchResponse {
        control_endpoint: HostInfo::from(local_v4(&server)),
        description: gateway_description(),
    };
    let mut out = [0u8; 1024];
    let len = encode_frame(&response, &mut out).unwrap();
    server.send_to(&out[..len], received.endpoint.socket_addr()).unwrap();
    println!("✓ SEARCH_RESPONSE sent ({} bytes)", len);

    // Client reads the gateway description
    let (len, _) = client.recv_from(&mut buffer).expect("No SEARCH_RESPONSE received");
    let frame = KnxnetIpFrame::parse(&buffer[..len]).unwrap();
    let parsed = frame.decode_body::<SearchResponse>().unwrap();
    println!("✓ SEARCH_RESPONSE parsed");

    let device = parsed.description.device_info.as_ref().unwrap();
    assert_eq!(device.friendly_name.as_str(), "KNX IP Router");
    assert!(device.is_programming_mode());
    assert!(parsed
        .description
        .supported_services
        .as_ref()
        .unwrap()
        .supports(ServiceFamilyType::Tunnelling));
    assert_eq!(parsed, response);
}

#[test]
fn test_description_response_frame() {
    let description = DescriptionResponse(gateway_description());
    let mut buffer = [0u8; 128];
    let len = encode_frame(&description, &mut buffer).unwrap();

    // Header + device info + supported services
    assert_eq!(len, 6 + DeviceInfo::SIZE + 6);
    assert_eq!(&buffer[..6], &[0x06, 0x10, 0x02, 0x04, 0x00, 0x42]);
    assert_eq!(&buffer[6..8], &[0x36, 0x01]);

    let frame = KnxnetIpFrame::parse(&buffer[..len]).unwrap();
    assert_eq!(frame.decode_body::<DescriptionResponse>().unwrap(), description);

    // Decoding as another service is rejected
    let err = frame.decode_body::<SearchRequest>().unwrap_err();
    assert!(err.is_unsupported_code());
}

#[test]
fn test_remote_diagnosis_exchange() {
    println!("\n=== Test: Remote Diagnosis ===");

    let endpoint = HostInfo::udp([192, 168, 1, 10], 3671);
    let selector = Selector::new(false, Some([0x00, 0x24, 0x6D, 0x01, 0x02, 0x03]));
    let request = DiagnosticRequest::new(endpoint, selector);

    let mut buffer = [0u8; 128];
    let len = encode_frame(&request, &mut buffer).unwrap();
    assert_eq!(len, 6 + 8 + 8);
    println!("✓ REMOTE_DIAGNOSTIC_REQUEST built ({} bytes)", len);

    // Response carries the echo plus a vendor block and an address list
    let mut body = std::vec::Vec::new();
    body.extend_from_slice(&buffer[6..len]);
    body.extend_from_slice(&[0x05, 0xFE, 0x00, 0xFA, 0x01]);
    body.extend_from_slice(&[0x06, 0x05, 0x11, 0x00, 0x11, 0x01]);

    let mut notes = heapless::Vec::<ScanNote, 4>::new();
    let (response, consumed) = DiagnosticResponse::decode_with(&body, &mut notes).unwrap();
    assert_eq!(consumed, body.len());
    assert_eq!(response.endpoint, endpoint);
    assert_eq!(response.selector, selector);
    println!("✓ REMOTE_DIAGNOSTIC_RESPONSE parsed");

    let unknown = &response.description.unknown_blocks;
    assert_eq!(unknown.len(), 1);
    assert_eq!(unknown[0].block_type, 0xFE);
    assert_eq!(unknown[0].data.as_slice(), &[0x00, 0xFA, 0x01]);
    assert_eq!(
        notes.as_slice(),
        &[ScanNote::ManufacturerData {
            block_type: 0xFE,
            length: 5
        }]
    );

    let addresses = &response.description.knx_addresses.as_ref().unwrap().addresses;
    assert_eq!(addresses.as_slice(), &[ia!(1, 1, 0), ia!(1, 1, 1)]);
}

#[test]
fn test_tunnelling_group_write() {
    println!("\n=== Test: Tunnelling Group Write ===");

    let source: IndividualAddress = "1.1.250".parse().unwrap();
    let destination = ga!(1 / 2 / 3);
    let tpdu = ApplicationUnit::new(Apci::GroupValueWrite, &[0x01]);
    let message = Message::LDataReq(LDataFrame::new(
        knx_wire::protocol::cemi::LData::new(source, destination, tpdu),
    ));

    let request = TunnelRequest::new(ConnectionHeader::new(7, 0), message);
    let mut buffer = [0u8; 64];
    let len = encode_frame(&request, &mut buffer).unwrap();
    println!("✓ TUNNELLING_REQUEST built ({} bytes)", len);

    assert_eq!(
        &buffer[..len],
        &[
            0x06, 0x10, 0x04, 0x20, 0x00, 0x15, // header
            0x04, 0x07, 0x00, 0x00, // connection header
            0x11, 0x00, 0x94, 0xE0, 0x11, 0xFA, 0x0A, 0x03, 0x01, 0x00, 0x81, // cEMI
        ]
    );

    let frame = KnxnetIpFrame::parse(&buffer[..len]).unwrap();
    let parsed = frame.decode_body::<TunnelRequest>().unwrap();
    let ldata = &parsed.message.frame().ldata;
    assert!(ldata.is_group_write());
    assert_eq!(ldata.destination_group(), Some(GroupAddress::new(1, 2, 3)));
    assert_eq!(ldata.data(), &[0x01]);
    println!("✓ TUNNELLING_REQUEST parsed");

    let ack = TunnelAck::new(parsed.connection_header, 0);
    let len = encode_frame(&ack, &mut buffer).unwrap();
    assert_eq!(&buffer[..len], &[0x06, 0x10, 0x04, 0x21, 0x00, 0x0B, 0x04, 0x07, 0x00, 0x00, 0x00]);
    println!("✓ TUNNELLING_ACK built");
}

#[test]
fn test_frame_with_unknown_service() {
    // Header parses, body stays opaque
    let data = [0x06, 0x10, 0x02, 0x05, 0x00, 0x08, 0x01, 0x02];
    let frame = KnxnetIpFrame::parse(&data).unwrap();
    assert_eq!(frame.service_type(), None);
    assert_eq!(frame.header().service, 0x0205);
    assert_eq!(frame.body(), &[0x01, 0x02]);
}

#[test]
fn test_message_decode_errors() {
    let err = Message::decode(&[]).unwrap_err();
    assert!(err.is_invalid_length());

    let err = Message::decode(&[0x2B, 0x00]).unwrap_err();
    assert!(err.is_unsupported_code());
}

#[test]
fn test_group_address_creation() {
    println!("\n=== Test: Group Address Creation ===");

    // 3-level addressing
    let addr = GroupAddress::new(1, 2, 3);
    assert_eq!(addr.raw(), 0x0A03);
    println!("✓ GroupAddress::new(1, 2, 3) -> 0x{:04X}", addr.raw());

    // 2-level and flat text
    assert_eq!("1/515".parse::<GroupAddress>().unwrap(), addr);
    assert_eq!("2563".parse::<GroupAddress>().unwrap(), addr);
    assert_eq!("0".parse::<GroupAddress>().unwrap().raw(), 0);
    assert!("0/0".parse::<GroupAddress>().is_err());
    println!("✓ GroupAddress text forms OK");
}

#[test]
fn test_individual_address_creation() {
    println!("\n=== Test: Individual Address Creation ===");

    let addr = IndividualAddress::new(1, 1, 250);
    assert_eq!(addr.raw(), 0x11FA);
    println!("✓ IndividualAddress::new(1, 1, 250) -> 0x{:04X}", addr.raw());

    let addr = IndividualAddress::from(0x11FA);
    assert_eq!(addr.to_string(), "1.1.250");
    assert_eq!("4602".parse::<IndividualAddress>().unwrap(), addr);
    assert!("16.0.0".parse::<IndividualAddress>().is_err());
    println!("✓ IndividualAddress::from(0x11FA) OK");
}

#[test]
fn test_host_info_socket_addr() {
    let addr = SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 2), 3671);
    let host = HostInfo::from(addr);
    let mut buf = [0u8; 8];
    host.encode(&mut buf).unwrap();
    assert_eq!(buf, [0x08, 0x01, 10, 0, 0, 2, 0x0E, 0x57]);
    assert_eq!(HostInfo::decode(&buf).unwrap().0.socket_addr(), addr);
}
