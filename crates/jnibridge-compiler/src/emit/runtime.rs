//! The runtime header every generated unit includes.
//!
//! Provides the support types the stubs and implementations share:
//!
//! | Name                         | Purpose                                    |
//! |------------------------------|--------------------------------------------|
//! | `jnibridge::TableStamp`      | version and fingerprint of the table       |
//! | `jnibridge::Span<T>`         | non-owning view of pinned array elements   |
//! | `jnibridge::GlobalRef`       | move-only owner of a JNI global reference  |
//! | `jnibridge::throwJava`       | raise a Java exception by class name       |
//! | `jnibridge::defaultReturn<T>`| value returned while an exception pends    |

/// File name used when the configuration does not override it.
pub const DEFAULT_RUNTIME_HEADER: &str = "jnibridge_runtime.hpp";

const BODY: &str = r#"#pragma once

#include <jni.h>

#include <cstddef>
#include <cstdint>

namespace jnibridge {

struct TableStamp {
    const char* generator_version;
    std::uint32_t entry_count;
    std::uint64_t fingerprint;
};

template <typename T>
struct Span {
    T* data;
    std::size_t size;

    T* begin() const noexcept { return data; }
    T* end() const noexcept { return data + size; }
    T& operator[](std::size_t i) const noexcept { return data[i]; }
    bool empty() const noexcept { return size == 0; }
};

// Owns a global reference and deletes it on destruction. Must be destroyed on
// a thread attached to the JVM that created it.
class GlobalRef {
public:
    GlobalRef(JNIEnv* env, jobject ref) noexcept : env_(env), ref_(ref) {}
    GlobalRef(const GlobalRef&) = delete;
    GlobalRef& operator=(const GlobalRef&) = delete;
    GlobalRef(GlobalRef&& other) noexcept : env_(other.env_), ref_(other.release()) {}
    GlobalRef& operator=(GlobalRef&& other) noexcept {
        if (this != &other) {
            reset();
            env_ = other.env_;
            ref_ = other.release();
        }
        return *this;
    }
    ~GlobalRef() { reset(); }

    jobject get() const noexcept { return ref_; }
    explicit operator bool() const noexcept { return ref_ != nullptr; }

    jobject release() noexcept {
        jobject ref = ref_;
        ref_ = nullptr;
        return ref;
    }

    void reset() noexcept {
        if (ref_ != nullptr) {
            env_->DeleteGlobalRef(ref_);
            ref_ = nullptr;
        }
    }

private:
    JNIEnv* env_;
    jobject ref_;
};

// Leaves an already pending exception in place.
inline void throwJava(JNIEnv* env, const char* class_name, const char* message) noexcept {
    if (env->ExceptionCheck()) {
        return;
    }
    jclass cls = env->FindClass(class_name);
    if (cls == nullptr) {
        return;
    }
    env->ThrowNew(cls, message);
    env->DeleteLocalRef(cls);
}

template <typename T>
inline T defaultReturn() noexcept {
    return T{};
}

template <>
inline void defaultReturn<void>() noexcept {}

}  // namespace jnibridge
"#;

/// Render the runtime header.
pub fn render_runtime_header(generator_version: &str) -> String {
    format!("// Generated by jnibridge {generator_version}. Do not edit.\n{BODY}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_declares_runtime_types() {
        let header = render_runtime_header("0.1.0");
        assert!(header.starts_with("// Generated by jnibridge 0.1.0. Do not edit.\n#pragma once"));
        for decl in [
            "struct TableStamp {",
            "struct Span {",
            "class GlobalRef {",
            "inline void throwJava(",
            "inline T defaultReturn()",
        ] {
            assert!(header.contains(decl), "missing {decl}");
        }
    }
}
