use std::path::{Path, PathBuf};

use super::{Cover, Extractor, NovelFileInfo, file_name};
use crate::{
    error::{Error, Result},
    store::CoverCache,
};

/// Extractor for files without a readable metadata format.
///
/// The file name stands in for the title, author and description; the date
/// is the modification time.
pub struct FileExtractor {
    path: PathBuf,
}

impl FileExtractor {
    /// Fails with [`Error::InvalidFile`] when `path` is not a regular file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::invalid_file(format!(
                "File {} does not exist",
                path.display()
            )));
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn title(&self) -> String {
        file_name(&self.path)
    }
}

impl Extractor for FileExtractor {
    fn path(&self) -> &Path {
        &self.path
    }

    fn novel_info(&self) -> NovelFileInfo {
        let title = self.title();
        NovelFileInfo {
            author: title.clone(),
            description: title.clone(),
            title,
            ..NovelFileInfo::for_path(&self.path)
        }
    }

    fn cover(&self, _cache: &dyn CoverCache) -> Cover {
        Cover::placeholder(&self.title())
    }
}
