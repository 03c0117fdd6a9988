//! Default configuration values

/// Project config file name
pub const CONFIG_FILE: &str = "distforge.toml";

/// Source manifest file name
pub const SOURCE_MANIFEST: &str = "package.json";

/// Production manifest file name written to the output directory
pub const PRODUCTION_MANIFEST: &str = "package.json";

/// Default output directory
pub const OUTPUT_DIR: &str = "dist";

/// Frontend assets directory, relative to the output directory
pub const FRONTEND_ASSETS_DIR: &str = "public";

/// Default frontend bundler command
pub const FRONTEND_PROGRAM: &str = "npx";
pub const FRONTEND_ARGS: &[&str] = &["vite", "build"];

/// Default backend bundler command
pub const BUNDLER_PROGRAM: &str = "npx";
pub const BUNDLER_ARGS: &[&str] = &["esbuild"];

/// Default backend entry point
pub const BACKEND_ENTRY: &str = "server/index.ts";

/// Default bundler platform and target
pub const BACKEND_PLATFORM: &str = "node";
pub const BACKEND_TARGET: &str = "node18";

/// Native helper modules that are never bundled
pub const HELPER_EXTERNALS: &[&str] = &["fsevents", "cpu-features"];

/// Source trees shipped by the source-copy strategy
pub const SOURCE_DIRS: &[&str] = &["server", "shared"];

/// Engine constraint written for source-copy builds: (runtime, constraint)
pub const SOURCE_COPY_ENGINE: (&str, &str) = ("node", ">=18.0.0");

/// Configuration files copied next to the build when present
pub const AUXILIARY_FILES: &[&str] = &["drizzle.config.ts", "tsconfig.json"];

/// Default native dependency registry: (name, minimum version)
pub const NATIVE_DEPENDENCIES: &[(&str, &str)] = &[("bcrypt", "^6.0.0")];

/// Supported native registry schema version
pub const NATIVE_REGISTRY_VERSION: u32 = 1;

/// Runtime used for smoke-import checks
pub const SMOKE_RUNTIME: &str = "node";

/// Smoke-test script written to the deployment directory
pub const SMOKE_SCRIPT: &str = "verify-native.mjs";

/// Installed module directory name
pub const MODULES_DIR: &str = "node_modules";

/// Package installer used in remediation hints and deployment notes
pub const INSTALL_COMMAND: &str = "npm install";

/// Environment variables the built application reads at runtime
pub const RUNTIME_ENV: &[&str] = &["DATABASE_URL", "SESSION_SECRET"];

/// Deployment notes file name
pub const DEPLOY_NOTES: &str = "README.md";

/// Minimum proptest iterations
pub const MIN_PROPTEST_ITERATIONS: u32 = 100;
