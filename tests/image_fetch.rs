mod common;

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

use common::*;
use roster_docs::Error;
use roster_docs::config::ReportConfig;
use roster_docs::media::{
    HttpImageSource, ImageSource, TransformProfile, fetch_raster, resolve_image, transform_url,
};
use roster_docs::model::{ImageFormat, PlaceholderReason};

const URL: &str = "https://res.cloudinary.com/liga/image/upload/v1712/front_1.jpg";

#[test]
fn jpeg_and_png_payloads_are_accepted() {
    let jpeg = StubSource::jpeg();
    assert_eq!(fetch_raster(&jpeg, URL).unwrap().format, ImageFormat::Jpeg);
    let png = StubSource::png();
    assert_eq!(fetch_raster(&png, URL).unwrap().format, ImageFormat::Png);
}

#[test]
fn other_payloads_are_invalid_format() {
    for body in [b"GIF89a".to_vec(), b"<html>".to_vec(), Vec::new(), vec![0xFF]] {
        let source = StubSource::new(move |_| Ok(body.clone()));
        let err = fetch_raster(&source, URL).unwrap_err();
        assert!(matches!(err, Error::InvalidImageFormat { ref url } if url == URL), "{err}");
    }
}

#[test]
fn fetch_errors_pass_through() {
    let source = StubSource::timeout();
    assert!(matches!(fetch_raster(&source, URL), Err(Error::Fetch { .. })));
}

#[test]
fn every_profile_carries_its_format_directive() {
    let host = ReportConfig::default().image_host;
    let cases = [
        (TransformProfile::ArchivePng, "/upload/f_png,"),
        (TransformProfile::spreadsheet(), "/upload/f_jpg,"),
        (TransformProfile::ReportThumbnail, "/upload/f_jpg,"),
    ];
    for (profile, needle) in cases {
        let out = transform_url(URL, profile, &host);
        assert!(out.contains(needle), "{profile:?}: {out}");
        assert!(out.ends_with("/v1712/front_1.jpg"));
    }
    assert!(transform_url(URL, TransformProfile::spreadsheet(), &host).contains("c_limit"));
}

#[test]
fn unknown_host_is_returned_unchanged() {
    let config = ReportConfig {
        image_host: "images.liga.example".to_string(),
        ..ReportConfig::default()
    };
    assert_eq!(
        transform_url(URL, TransformProfile::ArchivePng, &config.image_host),
        URL
    );
}

#[test]
fn resolve_reports_placeholder_reasons() {
    let config = ReportConfig::default();

    let source = StubSource::png();
    assert_eq!(
        resolve_image(&source, None, TransformProfile::ArchivePng, &config).unwrap_err(),
        PlaceholderReason::MissingReference
    );
    assert!(source.calls().is_empty());

    let img = resolve_image(&source, Some(URL), TransformProfile::ArchivePng, &config).unwrap();
    assert_eq!((img.pixel_width, img.pixel_height), (30, 20));
    assert_eq!(source.calls().len(), 1);
    assert!(source.calls()[0].contains("f_png"));

    let html = StubSource::html();
    assert_eq!(
        resolve_image(&html, Some(URL), TransformProfile::ArchivePng, &config).unwrap_err(),
        PlaceholderReason::InvalidFormat
    );

    let timeout = StubSource::timeout();
    assert!(matches!(
        resolve_image(&timeout, Some(URL), TransformProfile::ArchivePng, &config),
        Err(PlaceholderReason::Fetch(_))
    ));

    // Right signature, broken body.
    let broken = StubSource::new(|_| Ok(vec![0x89, 0x50, 0x4E, 0x47, 0, 0, 0]));
    assert!(matches!(
        resolve_image(&broken, Some(URL), TransformProfile::ArchivePng, &config),
        Err(PlaceholderReason::Undecodable(_))
    ));
}

/// What the local server does with the one request it accepts.
enum Reply {
    Status(&'static str),
    Body(&'static str, Vec<u8>),
    Stall(Duration),
}

/// Serve a single HTTP/1.1 request on a loopback port and return its URL.
fn serve_once(reply: Reply) -> (String, thread::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut line = String::new();
        while reader.read_line(&mut line).unwrap_or(0) > 0 && line != "\r\n" {
            line.clear();
        }
        let mut stream = stream;
        match reply {
            Reply::Status(status) => {
                let body = b"<html>missing</html>";
                let head = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let _ = stream.write_all(head.as_bytes());
                let _ = stream.write_all(body);
            }
            Reply::Body(content_type, body) => {
                let head = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let _ = stream.write_all(head.as_bytes());
                let _ = stream.write_all(&body);
            }
            Reply::Stall(wait) => thread::sleep(wait),
        }
        let _ = stream.flush();
    });
    (format!("http://{addr}/liga/front_1.jpg"), handle)
}

fn http_source() -> HttpImageSource {
    HttpImageSource::new(Duration::from_millis(200)).unwrap()
}

#[test]
fn http_error_status_is_a_fetch_error() {
    init_logger();
    let (url, server) = serve_once(Reply::Status("404 Not Found"));
    let err = http_source().fetch(&url).unwrap_err();
    assert!(
        matches!(err, Error::Fetch { url: ref u, ref reason } if *u == url && reason.contains("404")),
        "{err}"
    );
    server.join().unwrap();
}

#[test]
fn http_success_returns_the_body() {
    let jpeg = jpeg_bytes(30, 20);
    let (url, server) = serve_once(Reply::Body("image/jpeg", jpeg.clone()));
    let source = http_source();
    let raster = fetch_raster(&source, &url).unwrap();
    assert_eq!(raster.format, ImageFormat::Jpeg);
    assert_eq!(raster.data, jpeg);
    server.join().unwrap();
}

#[test]
fn http_stall_hits_the_request_timeout() {
    let (url, server) = serve_once(Reply::Stall(Duration::from_millis(1000)));
    let started = std::time::Instant::now();
    let err = http_source().fetch(&url).unwrap_err();
    assert!(matches!(err, Error::Fetch { .. }), "{err}");
    assert!(started.elapsed() < Duration::from_millis(900));
    server.join().unwrap();
}

#[test]
fn http_html_page_with_ok_status_is_invalid_format() {
    let (url, server) = serve_once(Reply::Body("text/html", b"<!doctype html><p>gone</p>".to_vec()));
    let source = http_source();
    let err = fetch_raster(&source, &url).unwrap_err();
    assert!(matches!(err, Error::InvalidImageFormat { url: ref u } if *u == url), "{err}");
    server.join().unwrap();
}
