//! A scripted NNTP server for end-to-end tests
//!
//! Binds a loopback listener and answers the ingest command subset from a
//! canned [`Fixture`]. Every received command line is recorded so tests can
//! assert on ordering and retry counts.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

/// Canned server state
#[derive(Clone, Default)]
pub struct Fixture {
    pub group: String,
    pub count: u32,
    pub first: u32,
    pub last: u32,
    /// Lines returned for any XOVER request
    pub xover: Vec<String>,
    /// Header blocks per article number, served over HEAD
    pub heads: HashMap<u32, Vec<String>>,
    /// Article numbers that always answer 430
    pub reject_heads: Vec<u32>,
    /// Expected AUTHINFO credentials; anything else is rejected
    pub auth: Option<(String, String)>,
}

impl Fixture {
    pub fn group(name: &str, count: u32, first: u32, last: u32) -> Fixture {
        Fixture {
            group: name.to_string(),
            count,
            first,
            last,
            ..Default::default()
        }
    }

    /// A plain header block for one article
    pub fn head_block(artnum: u32, subject: &str) -> Vec<String> {
        vec![
            format!("Subject: {}", subject),
            "From: poster@example.com".to_string(),
            "Date: 1 Jan 2020 00:00:00 GMT".to_string(),
            format!("Message-ID: <{}@example.com>", artnum),
            "Lines: 10".to_string(),
            "Bytes: 100".to_string(),
        ]
    }
}

pub struct MockServer {
    addr: SocketAddr,
    commands: Arc<Mutex<Vec<String>>>,
}

impl MockServer {
    pub fn start(fixture: Fixture) -> MockServer {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock server");
        let addr = listener.local_addr().expect("mock server addr");
        let commands = Arc::new(Mutex::new(Vec::new()));

        let fixture = Arc::new(fixture);
        let log = Arc::clone(&commands);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let stream = match stream {
                    Ok(stream) => stream,
                    Err(_) => return,
                };
                let fixture = Arc::clone(&fixture);
                let log = Arc::clone(&log);
                thread::spawn(move || serve(stream, fixture, log));
            }
        });

        MockServer { addr, commands }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Every command line received so far, across all connections
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

fn serve(stream: TcpStream, fixture: Arc<Fixture>, log: Arc<Mutex<Vec<String>>>) {
    let mut reader = BufReader::new(match stream.try_clone() {
        Ok(clone) => clone,
        Err(_) => return,
    });
    let mut writer = stream;
    let mut authed_user: Option<String> = None;

    send(&mut writer, "200 cronkite-mock ready");

    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).unwrap_or(0) == 0 {
            return;
        }
        let cmd = line.trim_end().to_string();
        log.lock().unwrap().push(cmd.clone());

        let mut parts = cmd.split_whitespace();
        match parts.next().unwrap_or("") {
            "GROUP" => {
                if parts.next() == Some(fixture.group.as_str()) {
                    send(
                        &mut writer,
                        &format!(
                            "211 {} {} {} {}",
                            fixture.count, fixture.first, fixture.last, fixture.group
                        ),
                    );
                } else {
                    send(&mut writer, "411 no such newsgroup");
                }
            }
            "XOVER" => {
                send(&mut writer, "224 overview information follows");
                for entry in &fixture.xover {
                    send(&mut writer, entry);
                }
                send(&mut writer, ".");
            }
            "HEAD" => {
                let artnum: u32 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
                if fixture.reject_heads.contains(&artnum) {
                    send(&mut writer, &format!("430 no article {}", artnum));
                } else if let Some(block) = fixture.heads.get(&artnum) {
                    send(
                        &mut writer,
                        &format!("221 {} <{}@example.com> headers follow", artnum, artnum),
                    );
                    for header in block {
                        send(&mut writer, header);
                    }
                    send(&mut writer, ".");
                } else {
                    send(&mut writer, &format!("430 no article {}", artnum));
                }
            }
            "AUTHINFO" => match (parts.next(), parts.next()) {
                (Some("USER"), Some(user)) => {
                    authed_user = Some(user.to_string());
                    send(&mut writer, "381 password required");
                }
                (Some("PASS"), Some(pass)) => {
                    let accepted = match (&fixture.auth, &authed_user) {
                        (Some((user, expected)), Some(got)) => user == got && expected == pass,
                        _ => false,
                    };
                    if accepted {
                        send(&mut writer, "281 authentication accepted");
                    } else {
                        send(&mut writer, "481 authentication rejected");
                    }
                }
                _ => send(&mut writer, "501 syntax error"),
            },
            // the mock has no certificate to offer
            "STARTTLS" => send(&mut writer, "502 cannot initiate TLS"),
            "QUIT" => {
                send(&mut writer, "205 bye");
                return;
            }
            _ => send(&mut writer, "500 command not recognized"),
        }
    }
}

fn send(writer: &mut TcpStream, line: &str) {
    let _ = writer.write_all(line.as_bytes());
    let _ = writer.write_all(b"\r\n");
}
