/// Constants describing the unified schema and its missing-value conventions.
pub mod schema {
    /// Literal token some origins use for absent values; never persisted as data.
    pub const MISSING_TOKEN: &str = "None";
    /// Separator joining multi-part solution lists into one string.
    pub const SOLUTION_SEPARATOR: &str = "\n\n---\n\n";
    /// Separator joining tag lists.
    pub const TAG_SEPARATOR: &str = ",";
    /// Suffix used for synthesized titles when an origin has no identifier.
    pub const TITLE_PLACEHOLDER_SUFFIX: &str = "problem";
}

/// Constants used by prompt normalization and acceptance.
pub mod normalize {
    /// Minimum prompt length, in characters, after normalization.
    pub const MIN_PROMPT_CHARS: usize = 20;
    /// Marker opening and closing a fenced code block.
    pub const CODE_FENCE: &str = "```";
}

/// Constants used by identity hashing.
pub mod identity {
    /// Delimiter placed between identity fields before hashing (ASCII unit separator).
    pub const IDENTITY_DELIMITER: &str = "\u{1f}";
}

/// Constants used by on-disk tier layout.
pub mod layout {
    /// Environment variable overriding the data directory.
    pub const DATA_DIR_ENV: &str = "PROBLEMSET_DATA_DIR";
    /// Default data directory relative to the working directory.
    pub const DEFAULT_DATA_DIR: &str = "data";
    /// RAW tier directory under the data directory.
    pub const RAW_DIR: &str = "raw";
    /// CLEAN tier directory under the data directory.
    pub const CLEAN_DIR: &str = "clean";
    /// UNION tier directory under the CLEAN directory.
    pub const UNION_DIR: &str = "_union";
    /// Extension of tier table files.
    pub const TABLE_EXTENSION: &str = "parquet";
    /// Column the UNION tier is partitioned by.
    pub const PARTITION_COLUMN: &str = "source";
    /// Data file name written inside every UNION partition directory.
    pub const PARTITION_FILE: &str = "part-00000.parquet";
    /// Partition directory value used for an empty partition key.
    pub const EMPTY_PARTITION_SEGMENT: &str = "__HIVE_DEFAULT_PARTITION__";
    /// Persisted union statistics file name.
    pub const STATS_FILE: &str = "_stats.json";
}

/// Constants used by the distributed union stage.
pub mod union {
    /// Number of rows written to the flat inspection sample.
    pub const SAMPLE_ROWS: usize = 50;
    /// Fixed name of the flat inspection sample.
    pub const SAMPLE_FILE: &str = "sample_50.csv";
    /// Default number of shuffle buckets for global deduplication.
    pub const DEFAULT_SHUFFLE_PARTITIONS: usize = 16;
    /// Thread-name prefix used by union worker threads.
    pub const WORKER_THREAD_PREFIX: &str = "problemset-union";
}

/// Constants used by HuggingFace dataset acquisition.
pub mod huggingface {
    /// Datasets-server endpoint listing converted parquet shards.
    pub const PARQUET_MANIFEST_ENDPOINT: &str = "https://datasets-server.huggingface.co/parquet";
    /// Environment variable holding an optional hub token.
    pub const TOKEN_ENV: &str = "HF_TOKEN";
    /// Environment variable overriding the shard cache directory.
    pub const CACHE_DIR_ENV: &str = "PROBLEMSET_HF_CACHE";
    /// Default shard cache directory under the data directory.
    pub const DEFAULT_CACHE_DIR: &str = "hf_cache";
    /// Shard extensions accepted from hub repository listings.
    pub const SHARD_EXTENSIONS: [&str; 3] = ["parquet", "jsonl", "json"];
    /// Download attempts per shard.
    pub const DOWNLOAD_RETRIES: usize = 5;
}

/// Constants used by object-storage configuration.
pub mod storage {
    /// Environment variable naming the bucket.
    pub const STORE_BUCKET_ENV: &str = "PROBLEMSET_STORE_BUCKET";
    /// Environment variable naming the bucket region.
    pub const STORE_REGION_ENV: &str = "PROBLEMSET_STORE_REGION";
    /// Environment variable overriding the S3 endpoint (S3-compatible services).
    pub const STORE_ENDPOINT_ENV: &str = "PROBLEMSET_STORE_ENDPOINT";
    /// Environment variable naming the default key prefix.
    pub const STORE_PREFIX_ENV: &str = "PROBLEMSET_STORE_PREFIX";
    /// Environment variable holding the access key.
    pub const ACCESS_KEY_ENV: &str = "PROBLEMSET_STORE_ACCESS_KEY";
    /// Environment variable holding the secret key.
    pub const SECRET_KEY_ENV: &str = "PROBLEMSET_STORE_SECRET_KEY";
    /// Region used when none is configured.
    pub const DEFAULT_REGION: &str = "us-east-1";
    /// Maximum keys returned per listing page.
    pub const LIST_PAGE_SIZE: usize = 1000;
}
