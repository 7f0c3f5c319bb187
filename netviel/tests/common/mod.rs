#![allow(dead_code)]
pub mod constants;

use anyhow::{bail, Context, Result};
use std::net::TcpStream;
use std::process::{Child, Command};
use std::thread;

use constants::{ADDR, PORT, SMALL_DELAY};

/// Kills the daemon when dropped, also when a check panics
struct Daemon(Child);

impl Drop for Daemon {
    fn drop(&mut self) {
        if let Err(e) = self.0.kill() {
            println!("unable to kill the daemon: {}", e);
        }
        let _ = self.0.wait();
    }
}

pub fn netviel_daemon_dev(mut fx: impl FnMut(&str) -> Result<()>) -> Result<()> {
    // Check port is not used (= free) before starting the test
    let mut max_retry = 20;
    loop {
        max_retry -= 1;
        match (TcpStream::connect(ADDR), max_retry) {
            (Ok(_), 0) => bail!("something is listening on {} and prevent the test from starting", ADDR),
            (Ok(_), _) => println!("something is listening on {}, maybe a previous daemon quitting, retrying soon...", ADDR),
            (Err(_), _) => {
                println!("test ready to start, {} is free!", ADDR);
                break;
            }
        }
        thread::sleep(SMALL_DELAY);
    }

    // Start daemon
    let _daemon = Daemon(
        Command::new(env!("CARGO_BIN_EXE_netviel"))
            .arg("--dev")
            .arg("--port")
            .arg(PORT)
            .env_remove("NETVIEL_CONFIG")
            .env_remove("NETVIEL_STATIC_DIR")
            .spawn()?,
    );

    // Check that our daemon is correctly listening on the free port
    let mut max_retry = 20;
    loop {
        max_retry -= 1;
        match (TcpStream::connect(ADDR), max_retry) {
            (Err(e), 0) => bail!("no more retry, last error is: {}", e),
            (Err(e), _) => println!("unable to connect: {} ; will retry soon...", e),
            (Ok(_), _) => break,
        }
        thread::sleep(SMALL_DELAY);
    }

    println!("-- ready to test http features --");
    let result = fx(&format!("http://{}", ADDR));
    println!("-- test teardown --");

    result.context("all tests passed")
}
