//! Class model built from the classloader trace.
//!
//! Classes named by `[Loaded ...]` lines are registered here. When a class
//! can be found as a `.class` file under a directory or inside a jar on the
//! classpath, its header is checked without loading or running any of its
//! code.

use super::{parse_signature, MemberIdentity, MemberResolver};
use crate::utils::config::MAX_CLASS_FILE_MAJOR;
use crate::utils::error::ClassLoadError;
use log::{debug, warn};
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use zip::result::ZipError;
use zip::ZipArchive;

const CLASS_MAGIC: u32 = 0xCAFE_BABE;

const ARCHIVE_EXTENSIONS: &[&str] = &["jar", "zip"];

type Archive = ZipArchive<BufReader<File>>;

/// Version information from the first eight bytes of a class file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassFileHeader {
    pub minor: u16,
    pub major: u16,
}

/// Known classes and the classpath used to introspect them
#[derive(Debug, Default)]
pub struct ClassModel {
    classes: BTreeSet<String>,
    classpath: Vec<PathBuf>,

    /// Archives opened so far; `None` marks one that could not be read
    archives: HashMap<PathBuf, Option<Archive>>,
}

impl ClassModel {
    pub fn new(classpath: Vec<PathBuf>) -> Self {
        Self {
            classes: BTreeSet::new(),
            classpath,
            archives: HashMap::new(),
        }
    }

    pub fn classpath(&self) -> &[PathBuf] {
        &self.classpath
    }

    /// Register a class named by the classloader trace
    ///
    /// `origin` is the location the trace says the class came from. A class
    /// found nowhere on the classpath is still registered unless its origin
    /// is a readable directory or archive, in which case it is reported as
    /// not found. A class whose file is unreadable or too new is not
    /// registered.
    pub fn add_class(&mut self, class_name: &str, origin: Option<&Path>) -> Result<(), ClassLoadError> {
        match self.find_header(class_name)? {
            Some(header) => {
                if header.major > MAX_CLASS_FILE_MAJOR {
                    return Err(ClassLoadError::UnsupportedVersion {
                        class: class_name.to_string(),
                        major: header.major,
                        supported: MAX_CLASS_FILE_MAJOR,
                    });
                }
                debug!(
                    "{} has class file version {}.{}",
                    class_name, header.major, header.minor
                );
            }
            None if origin.is_some_and(|o| o.is_dir() || is_archive(o)) => {
                return Err(ClassLoadError::NotFound(class_name.to_string()));
            }
            None => debug!("{} not found on classpath, registering by name", class_name),
        }

        self.classes.insert(class_name.to_string());
        Ok(())
    }

    pub fn contains(&self, class_name: &str) -> bool {
        self.classes.contains(class_name)
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Read the header of the first class file for `class_name` on the classpath
    fn find_header(&mut self, class_name: &str) -> Result<Option<ClassFileHeader>, ClassLoadError> {
        let relative = format!("{}.class", class_name.replace('.', "/"));
        let Self {
            classpath,
            archives,
            ..
        } = self;

        for entry in classpath.iter() {
            if entry.is_dir() {
                let candidate = entry.join(&relative);
                if candidate.is_file() {
                    return read_class_header(class_name, &candidate).map(Some);
                }
                continue;
            }

            if !is_archive(entry) {
                continue;
            }

            let archive = archives
                .entry(entry.clone())
                .or_insert_with(|| open_archive(entry));

            if let Some(archive) = archive {
                match archive.by_name(&relative) {
                    Ok(mut class_file) => {
                        return read_header_bytes(class_name, &mut class_file).map(Some);
                    }
                    Err(ZipError::FileNotFound) => {}
                    Err(e) => {
                        return Err(ClassLoadError::Io {
                            class: class_name.to_string(),
                            source: e.into(),
                        });
                    }
                }
            }
        }

        Ok(None)
    }
}

impl MemberResolver for ClassModel {
    fn resolve(&self, signature: &str) -> Option<MemberIdentity> {
        parse_signature(signature).filter(|identity| self.contains(&identity.class_name))
    }
}

/// Whether a classpath entry is a jar or zip file on disk
fn is_archive(path: &Path) -> bool {
    let has_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ARCHIVE_EXTENSIONS.iter().any(|a| ext.eq_ignore_ascii_case(a)));
    has_extension && path.is_file()
}

fn open_archive(path: &Path) -> Option<Archive> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            debug!("cannot open classpath archive {}: {}", path.display(), e);
            return None;
        }
    };

    match ZipArchive::new(BufReader::new(file)) {
        Ok(archive) => {
            debug!("opened {} ({} entries)", path.display(), archive.len());
            Some(archive)
        }
        Err(e) => {
            warn!("skipping unreadable classpath archive {}: {}", path.display(), e);
            None
        }
    }
}

/// Read the magic number and version of a class file
pub fn read_class_header(class_name: &str, path: &Path) -> Result<ClassFileHeader, ClassLoadError> {
    let mut file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ClassLoadError::NotFound(class_name.to_string()),
        _ => ClassLoadError::Io {
            class: class_name.to_string(),
            source: e,
        },
    })?;

    read_header_bytes(class_name, &mut file)
}

fn read_header_bytes<R: Read>(class_name: &str, reader: &mut R) -> Result<ClassFileHeader, ClassLoadError> {
    let mut bytes = [0u8; 8];
    reader.read_exact(&mut bytes).map_err(|e| ClassLoadError::Io {
        class: class_name.to_string(),
        source: e,
    })?;

    let magic = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    if magic != CLASS_MAGIC {
        return Err(ClassLoadError::BadMagic {
            class: class_name.to_string(),
            magic,
        });
    }

    Ok(ClassFileHeader {
        minor: u16::from_be_bytes([bytes[4], bytes[5]]),
        major: u16::from_be_bytes([bytes[6], bytes[7]]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use zip::write::{FileOptions, ZipWriter};

    fn write_class(dir: &Path, class_name: &str, bytes: &[u8]) {
        let path = dir.join(format!("{}.class", class_name.replace('.', "/")));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, bytes).unwrap();
    }

    const JAVA_8: &[u8] = &[0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 52];
    const TOO_NEW: &[u8] = &[0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 99];

    fn write_jar(path: &Path, entries: &[(&str, &[u8])]) {
        let mut zip = ZipWriter::new(fs::File::create(path).unwrap());
        for (name, bytes) in entries {
            zip.start_file(*name, FileOptions::default()).unwrap();
            zip.write_all(bytes).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_unknown_class_does_not_resolve() {
        let mut model = ClassModel::default();
        model.add_class("a.B", None).unwrap();

        assert!(model.resolve("a.B c ()V").is_some());
        assert!(model.resolve("x.Y c ()V").is_none());
    }

    #[test]
    fn test_valid_class_file_is_registered() {
        let dir = tempfile::tempdir().unwrap();
        write_class(dir.path(), "a.B", &[0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 52]);

        let mut model = ClassModel::new(vec![dir.path().to_path_buf()]);
        model.add_class("a.B", None).unwrap();
        assert!(model.contains("a.B"));
    }

    #[test]
    fn test_too_new_class_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_class(dir.path(), "a.New", &[0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 99]);

        let mut model = ClassModel::new(vec![dir.path().to_path_buf()]);
        let err = model.add_class("a.New", None).unwrap_err();

        assert!(err.is_fatal());
        assert!(!model.contains("a.New"));
    }

    #[test]
    fn test_bad_magic_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_class(dir.path(), "a.Bad", b"not a class");

        let mut model = ClassModel::new(vec![dir.path().to_path_buf()]);
        let err = model.add_class("a.Bad", None).unwrap_err();

        assert!(matches!(err, ClassLoadError::BadMagic { .. }));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_missing_file_reports_not_found() {
        let err = read_class_header("a.B", Path::new("/nonexistent/a/B.class")).unwrap_err();
        assert!(matches!(err, ClassLoadError::NotFound(_)));
    }

    #[test]
    fn test_class_in_jar_is_checked() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("app.jar");
        write_jar(
            &jar,
            &[
                ("META-INF/MANIFEST.MF", &b"Manifest-Version: 1.0\n"[..]),
                ("a/B.class", JAVA_8),
                ("a/New.class", TOO_NEW),
            ],
        );

        let mut model = ClassModel::new(vec![jar.clone()]);
        model.add_class("a.B", Some(&jar)).unwrap();
        assert!(model.contains("a.B"));

        let err = model.add_class("a.New", Some(&jar)).unwrap_err();
        assert!(matches!(
            err,
            ClassLoadError::UnsupportedVersion { major: 99, .. }
        ));
        assert!(err.is_fatal());
        assert!(!model.contains("a.New"));
    }

    #[test]
    fn test_bad_magic_in_jar() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("lib.zip");
        write_jar(&jar, &[("a/Bad.class", &b"PK not a class"[..])]);

        let mut model = ClassModel::new(vec![jar]);
        let err = model.add_class("a.Bad", None).unwrap_err();
        assert!(matches!(err, ClassLoadError::BadMagic { .. }));
    }

    #[test]
    fn test_directory_entry_wins_over_later_jar() {
        let dir = tempfile::tempdir().unwrap();
        write_class(dir.path(), "a.B", JAVA_8);
        let jar = dir.path().join("new.jar");
        write_jar(&jar, &[("a/B.class", TOO_NEW)]);

        let mut model = ClassModel::new(vec![dir.path().to_path_buf(), jar]);
        model.add_class("a.B", None).unwrap();
        assert!(model.contains("a.B"));
    }

    #[test]
    fn test_unreadable_archive_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("broken.jar");
        fs::write(&jar, b"not a zip").unwrap();

        let mut model = ClassModel::new(vec![jar]);
        model.add_class("a.B", None).unwrap();
        model.add_class("a.C", None).unwrap();
        assert_eq!(model.class_count(), 2);
    }

    #[test]
    fn test_class_missing_from_its_origin_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("app.jar");
        write_jar(&jar, &[("a/Other.class", JAVA_8)]);

        let mut model = ClassModel::new(vec![jar.clone()]);
        let err = model.add_class("a.B", Some(&jar)).unwrap_err();
        assert!(matches!(err, ClassLoadError::NotFound(ref class) if class == "a.B"));
        assert!(!err.is_fatal());
        assert!(!model.contains("a.B"));

        // an origin that is not on this machine is not an error
        model
            .add_class("a.B", Some(Path::new("/nonexistent/app.jar")))
            .unwrap();
        assert!(model.contains("a.B"));
    }
}
