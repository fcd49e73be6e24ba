use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    #[error("block device I/O error")]
    Io,
    #[error("invalid superblock")]
    InvalidSuperBlock,
    #[error("no such file or directory")]
    NotFound,
    #[error("not a directory")]
    NotADirectory,
    #[error("is a directory")]
    IsADirectory,
    #[error("file exists")]
    AlreadyExists,
    #[error("directory not empty")]
    NotEmpty,
    #[error("no space left on device")]
    NoSpace,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("file too large")]
    FileTooLarge,
}

impl FsError {
    /// POSIX errno reported to a FUSE-style host, positive.
    pub fn errno(&self) -> i32 {
        match self {
            FsError::Io | FsError::InvalidSuperBlock => libc::EIO,
            FsError::NotFound => libc::ENOENT,
            FsError::NotADirectory => libc::ENOTDIR,
            FsError::IsADirectory => libc::EISDIR,
            FsError::AlreadyExists => libc::EEXIST,
            FsError::NotEmpty => libc::ENOTEMPTY,
            FsError::NoSpace => libc::ENOSPC,
            FsError::InvalidArgument => libc::EINVAL,
            FsError::FileTooLarge => libc::EFBIG,
        }
    }
}

pub type Result<T> = core::result::Result<T, FsError>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_errno() {
        assert_eq!(FsError::NotFound.errno(), libc::ENOENT);
        assert_eq!(FsError::NotEmpty.errno(), libc::ENOTEMPTY);
        assert_eq!(FsError::Io.errno(), libc::EIO);
    }
}
