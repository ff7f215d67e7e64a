//! A scripted backend on a local port that records what the console sends.

use std::{
    io::{BufRead, BufReader, Read, Write},
    net::{TcpListener, TcpStream},
    sync::mpsc::{self, Receiver},
    thread,
    time::Duration,
};

use rocket::{figment::providers::Serialized, local::blocking::Client, Config};

/// One request as the backend received it.
pub struct Captured {
    pub request_line: String,
    headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Captured {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn headers(&self, name: &str) -> usize {
        self.headers
            .iter()
            .filter(|(key, _)| key.eq_ignore_ascii_case(name))
            .count()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

pub struct Stub {
    pub url: String,
    requests: Receiver<Captured>,
}

impl Stub {
    /// Answers each incoming connection with the next `(status, content type,
    /// body)` reply, then stops listening.
    pub fn serve(replies: Vec<(u16, &'static str, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let (sender, requests) = mpsc::channel();

        thread::spawn(move || {
            for (status, content_type, body) in replies {
                let Ok((mut stream, _)) = listener.accept() else {
                    return;
                };
                let captured = read_request(&stream);
                let reply = format!(
                    "HTTP/1.1 {status} Stub\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(reply.as_bytes());
                if sender.send(captured).is_err() {
                    return;
                }
            }
        });

        Self { url, requests }
    }

    pub fn json(status: u16, body: &str) -> Self {
        Self::serve(vec![(status, "application/json", body.to_string())])
    }

    pub fn next(&self) -> Captured {
        self.requests
            .recv_timeout(Duration::from_secs(5))
            .expect("the backend received a request")
    }

    pub fn untouched(&self) -> bool {
        self.requests.recv_timeout(Duration::from_millis(200)).is_err()
    }

    /// The console, pointed at this backend.
    pub fn console(&self) -> Client {
        self.console_with(&[])
    }

    pub fn console_with(&self, overrides: &[(&str, u64)]) -> Client {
        let mut figment = Config::figment().merge(Serialized::default("admin.backend_url", &self.url));
        for (key, value) in overrides {
            figment = figment.merge(Serialized::default(key, value));
        }
        Client::tracked(crate::rocket().configure(figment)).expect("valid rocket instance")
    }
}

fn read_request(stream: &TcpStream) -> Captured {
    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).unwrap();

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((key, value)) = line.split_once(':') {
            headers.push((key.trim().to_string(), value.trim().to_string()));
        }
    }

    let length = headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.parse::<usize>().ok());
    let chunked = headers
        .iter()
        .any(|(key, value)| key.eq_ignore_ascii_case("transfer-encoding") && value.contains("chunked"));

    let mut body = Vec::new();
    if let Some(length) = length {
        body.resize(length, 0);
        reader.read_exact(&mut body).unwrap();
    } else if chunked {
        loop {
            let mut size = String::new();
            reader.read_line(&mut size).unwrap();
            let size = usize::from_str_radix(size.trim(), 16).unwrap_or(0);
            let mut chunk = vec![0; size + 2];
            reader.read_exact(&mut chunk).unwrap();
            if size == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..size]);
        }
    }

    Captured {
        request_line: request_line.trim_end().to_string(),
        headers,
        body,
    }
}
