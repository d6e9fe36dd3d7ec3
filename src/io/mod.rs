//! Input and output utility.
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead};
use std::path::{self, Path, PathBuf};

/// Helper function for creating `io::Error` with
/// `io::ErrorKind::InvalidData`.
pub fn invalid_data<E: Into<Box<dyn Error + Send + Sync>>>(error: E) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, error)
}

/// Works just like Python's `os.path.splitext`.  Note that the returned
/// extension includes the dot.  If there is no extension, returns an empty
/// string as the extension.  Only works on UTF-8 strings due to limitations
/// of the `std::path::Path` API.
pub fn split_extension(path: &Path) -> io::Result<(&str, &str)> {
    let path = path.to_str()
        .ok_or_else(|| invalid_data("path is not UTF-8"))?;
    match path.rfind('.') {
        None => Ok((path, "")),
        Some(i) => {
            let ext = &path[i ..];
            if ext.chars().any(|c| path::is_separator(c)) {
                Ok((path, ""))
            } else {
                Ok((&path[.. i], ext))
            }
        }
    }
}

/// Open a compressed file and decode based on the file extension.
/// If the extension does not end in "z", the file is read as-is.
pub fn open_compressed(path: &Path) -> io::Result<Box<dyn io::Read>> {
    use flate2;
    use xz2;

    let file = File::open(path)?;
    let (_, ext) = split_extension(path)?;
    Ok(match ext {
        ".gz" => Box::new(flate2::read::GzDecoder::new(file)),
        ".xz" => Box::new(xz2::read::XzDecoder::new(file)),
        ext if ext.ends_with("z") => return Err(invalid_data(
            format!("unrecognized compression format: {}", ext),
        )),
        _ => Box::new(file),
    })
}

/// Open `path`, or else `path.gz`, or else `path.xz`.  On failure, the
/// error of the plain path is returned.
pub fn open_with_fallback(path: &Path) -> io::Result<(PathBuf, Box<dyn io::Read>)> {
    let plain_err = match open_compressed(path) {
        Ok(r) => return Ok((path.to_owned(), r)),
        Err(e) => e,
    };
    let name = path.to_str()
        .ok_or_else(|| invalid_data("path is not UTF-8"))?;
    for ext in &[".gz", ".xz"] {
        let alt = PathBuf::from(format!("{}{}", name, ext));
        if alt.is_file() {
            let r = open_compressed(&alt)?;
            return Ok((alt, r));
        }
    }
    Err(plain_err)
}

/// Reads the leading floating-point field of every non-blank line.  The
/// remaining fields are ignored.  Lines starting with `#` are comments.
pub struct FirstFieldParser<R> {
    lines: io::Lines<io::BufReader<R>>,
    status: Option<io::Error>,
}

impl<R: io::Read> FirstFieldParser<R> {
    pub fn new(r: R) -> Self {
        Self {
            lines: io::BufReader::new(r).lines(),
            status: None,
        }
    }
}

impl<R> FirstFieldParser<R> {
    pub fn status(self) -> Option<io::Error> {
        self.status
    }
}

impl<R: io::Read> FirstFieldParser<R> {
    pub fn match_f64(&mut self) -> io::Result<Option<f64>> {
        loop {
            let line = match self.lines.next() {
                None => return Ok(None),
                Some(line) => line?,
            };
            let field = match line.split_whitespace().next() {
                None => continue,
                Some(field) => field,
            };
            if field.starts_with('#') {
                continue;
            }
            return Ok(Some(field.parse().map_err(|_| {
                invalid_data(format!("not a number: {:?}", field))
            })?));
        }
    }
}

impl<R: io::Read> Iterator for FirstFieldParser<R> {
    type Item = f64;
    fn next(&mut self) -> Option<Self::Item> {
        match self.match_f64() {
            Err(e) => {
                self.status = Some(e);
                None
            }
            Ok(r) => r,
        }
    }
}

/// Read the leading float of each line of a (possibly compressed) file.
pub fn read_first_fields(path: &Path) -> io::Result<(PathBuf, Vec<f64>)> {
    let (path, r) = open_with_fallback(path)?;
    let mut parser = FirstFieldParser::new(r);
    let values: Vec<f64> = parser.by_ref().collect();
    match parser.status() {
        Some(e) => Err(e),
        None => Ok((path, values)),
    }
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io::Write;
    use super::*;

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("a/b.gz".as_ref()).unwrap(), ("a/b", ".gz"));
        assert_eq!(split_extension("a.b/c".as_ref()).unwrap(), ("a.b/c", ""));
        assert_eq!(split_extension("c".as_ref()).unwrap(), ("c", ""));
    }

    #[test]
    fn test_first_fields() {
        let text = "0.5 1 2 3\n\n# comment\n-1.25e-1 0 0\n";
        let mut parser = FirstFieldParser::new(text.as_bytes());
        let values: Vec<_> = parser.by_ref().collect();
        assert!(parser.status().is_none());
        assert_eq!(values, vec![0.5, -0.125]);

        let mut parser = FirstFieldParser::new("1.0\nabc\n".as_bytes());
        let values: Vec<_> = parser.by_ref().collect();
        assert_eq!(values, vec![1.0]);
        assert!(parser.status().is_some());
    }

    #[test]
    fn test_gz_fallback() {
        use flate2::Compression;
        use flate2::write::GzEncoder;

        let dir = env::temp_dir().join(format!("acm-io-test-{}", ::std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let plain = dir.join("table");
        {
            let file = fs::File::create(dir.join("table.gz")).unwrap();
            let mut enc = GzEncoder::new(file, Compression::default());
            enc.write_all(b"0.25 0 0\n0.75 1 1\n").unwrap();
            enc.finish().unwrap();
        }
        let (found, values) = read_first_fields(&plain).unwrap();
        assert_eq!(found, dir.join("table.gz"));
        assert_eq!(values, vec![0.25, 0.75]);
        assert!(read_first_fields(&dir.join("missing")).is_err());
        fs::remove_dir_all(&dir).unwrap();
    }
}
