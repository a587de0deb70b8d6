//! Matrix helpers
//!
//! Matrices are plain column-major `[[f32; 4]; 4]` arrays so they can be
//! uploaded as-is. `m[col][row]`.

/// Column-major 4x4 matrix
pub type Mat4 = [[f32; 4]; 4];

/// Identity matrix
pub const IDENTITY_MATRIX: Mat4 = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Multiply two 4x4 matrices (`a * b`)
pub fn multiply_mat4(a: &Mat4, b: &Mat4) -> Mat4 {
    let mut result = [[0.0f32; 4]; 4];

    for i in 0..4 {
        for j in 0..4 {
            result[i][j] = a[0][j] * b[i][0]
                         + a[1][j] * b[i][1]
                         + a[2][j] * b[i][2]
                         + a[3][j] * b[i][3];
        }
    }

    result
}

/// Transform a vec4 by a matrix
pub fn transform_vec4(m: &Mat4, v: [f32; 4]) -> [f32; 4] {
    [
        m[0][0] * v[0] + m[1][0] * v[1] + m[2][0] * v[2] + m[3][0] * v[3],
        m[0][1] * v[0] + m[1][1] * v[1] + m[2][1] * v[2] + m[3][1] * v[3],
        m[0][2] * v[0] + m[1][2] * v[1] + m[2][2] * v[2] + m[3][2] * v[3],
        m[0][3] * v[0] + m[1][3] * v[1] + m[2][3] * v[2] + m[3][3] * v[3],
    ]
}

/// Read one row of a column-major matrix
#[inline]
pub fn row(m: &Mat4, r: usize) -> [f32; 4] {
    [m[0][r], m[1][r], m[2][r], m[3][r]]
}

/// Overwrite one row of a column-major matrix
#[inline]
pub fn set_row(m: &mut Mat4, r: usize, values: [f32; 4]) {
    for (c, value) in values.into_iter().enumerate() {
        m[c][r] = value;
    }
}

/// Build a transform from a translation and a forward (+Z) axis.
///
/// Used to describe light transforms; X/Y are any orthonormal completion.
pub fn from_translation_forward(translation: [f32; 3], forward: [f32; 3]) -> Mat4 {
    let f = normalize(forward);
    let up = if f[1].abs() > 0.9 { [0.0, 0.0, 1.0] } else { [0.0, 1.0, 0.0] };
    let x = normalize(cross(up, f));
    let y = cross(f, x);

    [
        [x[0], x[1], x[2], 0.0],
        [y[0], y[1], y[2], 0.0],
        [f[0], f[1], f[2], 0.0],
        [translation[0], translation[1], translation[2], 1.0],
    ]
}

/// Create an orthographic projection matrix with a [0, 1] depth range
pub fn orthographic(
    left: f32,
    right: f32,
    bottom: f32,
    top: f32,
    near: f32,
    far: f32,
) -> Mat4 {
    let rml = right - left;
    let tmb = top - bottom;
    let fmn = far - near;

    [
        [2.0 / rml, 0.0, 0.0, 0.0],
        [0.0, 2.0 / tmb, 0.0, 0.0],
        [0.0, 0.0, -1.0 / fmn, 0.0],
        [-(right + left) / rml, -(top + bottom) / tmb, -near / fmn, 1.0],
    ]
}

/// Normalize a vec3
pub fn normalize(v: [f32; 3]) -> [f32; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if len > 1e-10 {
        [v[0] / len, v[1] / len, v[2] / len]
    } else {
        [0.0, 0.0, 1.0]
    }
}

/// Cross product
pub fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}
