//! Match sink. One mutex-protected writer shared by every worker; the
//! critical section covers a single record. The output file is opened per
//! hit in append mode so records from concurrent runs interleave whole.

use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

pub struct OutputSink {
    path: Option<String>,
    lock: Mutex<()>,
}

impl OutputSink {
    pub fn new(path: Option<String>) -> Self {
        OutputSink {
            path,
            lock: Mutex::new(()),
        }
    }

    /// Append one found-key record, atomically with respect to other
    /// workers. Falls back to stdout when the output file cannot be
    /// opened.
    pub fn write_match(&self, address: &str, wif: &str, hex_key: &str) {
        let _guard = self.lock.lock().unwrap();

        let record = format!(
            "\nPub Addr: {}\nPriv (WIF): {}\nPriv (HEX): 0x{}\n",
            address, wif, hex_key
        );

        if let Some(path) = &self.path {
            match OpenOptions::new().create(true).append(true).open(path) {
                Ok(mut f) => {
                    if f.write_all(record.as_bytes()).is_ok() {
                        return;
                    }
                    println!("Cannot write to {}", path);
                }
                Err(_) => println!("Cannot open {} for writing", path),
            }
        }
        print!("{}", record);
        let _ = std::io::stdout().flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn records_append_whole() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("vanityhunt-sink-{}.txt", std::process::id()));
        let path_str = path.to_str().unwrap().to_string();
        let _ = std::fs::remove_file(&path);

        let sink = Arc::new(OutputSink::new(Some(path_str.clone())));
        let mut handles = Vec::new();
        for i in 0..4 {
            let sink = Arc::clone(&sink);
            handles.push(thread::spawn(move || {
                sink.write_match(&format!("1Addr{}", i), "Kwif", "00ff");
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.matches("Pub Addr: ").count(), 4);
        assert_eq!(contents.matches("Priv (WIF): Kwif").count(), 4);
        assert_eq!(contents.matches("Priv (HEX): 0x00ff").count(), 4);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_file_falls_back_to_stdout() {
        // a directory path can never be opened as a file
        let sink = OutputSink::new(Some("/".to_string()));
        sink.write_match("1Addr", "Kwif", "00ff"); // must not panic
    }
}
