// src/io/fasta.rs
//! Streaming FASTA input and output, with transparent gzip by extension.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

/// One FASTA record. The id is the first whitespace-delimited token of the
/// header; the sequence is folded to upper case.
#[derive(Debug, Clone)]
pub struct FastaRecord {
    pub id: String,
    pub seq: String,
}

/// Open a FASTA file for reading, decompressing gzipped files automatically.
pub fn open_fasta(path: &str) -> io::Result<Box<dyn BufRead + Send>> {
    let file = File::open(path)?;
    if path.ends_with(".gz") {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Streaming FASTA parser.
///
/// Yields records one at a time with bounded memory; multi-line sequences
/// are concatenated. Content before the first header is a parse error.
pub struct FastaReader<R: BufRead> {
    reader: R,
    pending_header: Option<String>,
    done: bool,
}

impl<R: BufRead> FastaReader<R> {
    pub fn new(reader: R) -> Self {
        FastaReader { reader, pending_header: None, done: false }
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line)?;
        if n == 0 {
            return Ok(None);
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(Some(line))
    }
}

impl<R: BufRead> Iterator for FastaReader<R> {
    type Item = io::Result<FastaRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        // find the next header
        let header = match self.pending_header.take() {
            Some(header) => header,
            None => loop {
                match self.read_line() {
                    Ok(None) => {
                        self.done = true;
                        return None;
                    }
                    Ok(Some(line)) => {
                        if line.is_empty() {
                            continue;
                        }
                        if line.starts_with('>') {
                            break line;
                        }
                        self.done = true;
                        return Some(Err(io::Error::new(
                            io::ErrorKind::InvalidData,
                            format!("expected FASTA header, found: {}", line),
                        )));
                    }
                    Err(e) => {
                        self.done = true;
                        return Some(Err(e));
                    }
                }
            },
        };
        let id = header[1..].split_whitespace().next().unwrap_or("").to_string();

        // accumulate sequence lines until the next header or EOF
        let mut seq = String::new();
        loop {
            match self.read_line() {
                Ok(None) => {
                    self.done = true;
                    break;
                }
                Ok(Some(line)) => {
                    if line.starts_with('>') {
                        self.pending_header = Some(line);
                        break;
                    }
                    seq.push_str(line.trim().to_ascii_uppercase().as_str());
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        Some(Ok(FastaRecord { id, seq }))
    }
}

/// Reads records from several FASTA files in sequence, as one stream.
pub struct FastaConcat {
    paths: std::vec::IntoIter<String>,
    current: Option<FastaReader<Box<dyn BufRead + Send>>>,
}

impl FastaConcat {
    pub fn new(paths: &[String]) -> Self {
        FastaConcat {
            paths: paths.to_vec().into_iter(),
            current: None,
        }
    }
}

impl Iterator for FastaConcat {
    type Item = io::Result<FastaRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(reader) = self.current.as_mut() {
                match reader.next() {
                    Some(item) => return Some(item),
                    None => self.current = None,
                }
            }
            let path = self.paths.next()?;
            match open_fasta(&path) {
                Ok(reader) => self.current = Some(FastaReader::new(reader)),
                Err(e) => {
                    return Some(Err(io::Error::new(
                        e.kind(),
                        format!("{}: {}", path, e),
                    )))
                }
            }
        }
    }
}

/// FASTA writer over any byte sink.
pub struct FastaWriter<W: Write> {
    inner: W,
}

impl<W: Write> FastaWriter<W> {
    pub fn from_writer(inner: W) -> Self {
        FastaWriter { inner }
    }

    pub fn write_record(&mut self, id: &str, seq: &str) -> io::Result<()> {
        writeln!(self.inner, ">{}", id)?;
        writeln!(self.inner, "{}", seq)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Open a FASTA output sink: a file (gzipped if the name ends in .gz), or
/// stdout when no path is given.
pub fn create_output(path: Option<&str>) -> io::Result<FastaWriter<Box<dyn Write + Send>>> {
    let inner: Box<dyn Write + Send> = match path {
        Some(path) => {
            let file = File::create(path)?;
            if path.ends_with(".gz") {
                Box::new(BufWriter::new(GzEncoder::new(file, Compression::default())))
            } else {
                Box::new(BufWriter::new(file))
            }
        }
        None => Box::new(io::stdout()),
    };
    Ok(FastaWriter::from_writer(inner))
}
