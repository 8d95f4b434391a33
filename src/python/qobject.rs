//! Script-side QObject classes.
//!
//! Containers hold shared handles. `d[k]` returns the stored object itself,
//! and an object put into a container stays live: edits made later through
//! any reference show up in the submitted message. Plain Python values handed
//! to `qdict_put`/`qlist_append` are wrapped in the matching class first.

use indexmap::IndexMap;
use pyo3::exceptions::{PyIndexError, PyTypeError, PyValueError};
use pyo3::prelude::*;
use pyo3::pyclass::{PyTraverseError, PyVisit};
use pyo3::types::{
    PyBool, PyByteArray, PyBytes, PyDict, PyFloat, PyIterator, PyList, PyLong, PyString, PyTuple,
};

use crate::jobs::JobClient;
use crate::qobject::{QDict, QList, QNum, QObject, QType};
use crate::runtime;
use crate::types::{Error, QueueName};

/// Deepest container nesting accepted when a message is materialized. Also
/// stops self-referencing containers.
const MAX_DEPTH: usize = 64;

#[pyclass(name = "QObjectTypes", module = "pyqemu", eq, eq_int)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PyQObjectTypes {
    #[pyo3(name = "QTYPE_QNULL")]
    Null = 1,
    #[pyo3(name = "QTYPE_QNUM")]
    Num = 2,
    #[pyo3(name = "QTYPE_QSTRING")]
    Str = 3,
    #[pyo3(name = "QTYPE_QDICT")]
    Dict = 4,
    #[pyo3(name = "QTYPE_QLIST")]
    List = 5,
    #[pyo3(name = "QTYPE_QBOOL")]
    Bool = 6,
}

// =============================================================================
// Conversions
// =============================================================================

fn extract_num(value: &Bound<'_, PyAny>) -> PyResult<QNum> {
    if value.is_instance_of::<PyFloat>() {
        return Ok(QNum::Double(value.extract()?));
    }
    if let Ok(v) = value.extract::<i64>() {
        return Ok(QNum::I64(v));
    }
    if let Ok(v) = value.extract::<u64>() {
        return Ok(QNum::U64(v));
    }
    Err(PyTypeError::new_err(format!(
        "QNum expects an int or float within 64 bits, got {}",
        value.repr()?
    )))
}

fn num_to_py(py: Python<'_>, num: QNum) -> PyObject {
    match num {
        QNum::I64(v) => v.into_py(py),
        QNum::U64(v) => v.into_py(py),
        QNum::Double(d) => d.into_py(py),
    }
}

fn is_qobject(value: &Bound<'_, PyAny>) -> bool {
    value.is_instance_of::<PyQNull>()
        || value.is_instance_of::<PyQNum>()
        || value.is_instance_of::<PyQString>()
        || value.is_instance_of::<PyQDict>()
        || value.is_instance_of::<PyQList>()
        || value.is_instance_of::<PyQBool>()
}

/// Handle to store in a container: QObject instances are shared as-is,
/// plain Python values are wrapped.
pub(crate) fn into_node(value: &Bound<'_, PyAny>) -> PyResult<PyObject> {
    let py = value.py();
    if is_qobject(value) {
        return Ok(value.clone().unbind());
    }
    if value.is_none() {
        return Ok(Py::new(py, PyQNull)?.into_py(py));
    }
    // bool before int: Python bools are ints
    if value.is_instance_of::<PyBool>() {
        return Ok(Py::new(py, PyQBool { value: value.extract()? })?.into_py(py));
    }
    if value.is_instance_of::<PyLong>() || value.is_instance_of::<PyFloat>() {
        return Ok(Py::new(py, PyQNum { value: extract_num(value)? })?.into_py(py));
    }
    if value.is_instance_of::<PyString>() {
        return Ok(Py::new(py, PyQString { value: value.extract()? })?.into_py(py));
    }
    if let Ok(dict) = value.downcast::<PyDict>() {
        let mut out = PyQDict::default();
        for (k, v) in dict.iter() {
            out.value.insert(k.str()?.to_string(), into_node(&v)?);
        }
        return Ok(Py::new(py, out)?.into_py(py));
    }
    if value.is_instance_of::<PyList>() || value.is_instance_of::<PyTuple>() {
        let mut out = PyQList::default();
        for item in value.iter()? {
            out.value.push(into_node(&item?)?);
        }
        return Ok(Py::new(py, out)?.into_py(py));
    }
    Err(PyTypeError::new_err(format!(
        "cannot convert {} to a QObject",
        value.get_type().name()?
    )))
}

/// Materialize the message rooted at `value`. Plain Python values are
/// wrapped first, as if they had been put into a container.
pub(crate) fn to_qobject(value: &Bound<'_, PyAny>) -> PyResult<QObject> {
    materialize(value, 0)
}

fn materialize(value: &Bound<'_, PyAny>, depth: usize) -> PyResult<QObject> {
    if depth > MAX_DEPTH {
        return Err(PyValueError::new_err(format!(
            "message nests deeper than {MAX_DEPTH} levels"
        )));
    }
    let py = value.py();
    if let Ok(dict) = value.downcast::<PyQDict>() {
        let mut out = QDict::new();
        for (k, v) in &dict.borrow().value {
            out.put(k, materialize(v.bind(py), depth + 1)?);
        }
        return Ok(QObject::Dict(out));
    }
    if let Ok(list) = value.downcast::<PyQList>() {
        let mut out = QList::new();
        for item in &list.borrow().value {
            out.append(materialize(item.bind(py), depth + 1)?);
        }
        return Ok(QObject::List(out));
    }
    if let Ok(num) = value.downcast::<PyQNum>() {
        return Ok(QObject::Num(num.borrow().value));
    }
    if let Ok(s) = value.downcast::<PyQString>() {
        return Ok(QObject::String(s.borrow().value.clone()));
    }
    if let Ok(b) = value.downcast::<PyQBool>() {
        return Ok(QObject::Bool(b.borrow().value));
    }
    if value.is_instance_of::<PyQNull>() {
        return Ok(QObject::Null);
    }
    materialize(into_node(value)?.bind(py), depth)
}

// =============================================================================
// Scalars
// =============================================================================

#[pyclass(name = "QNull", module = "pyqemu")]
#[derive(Debug, Clone, Copy)]
pub struct PyQNull;

#[pymethods]
impl PyQNull {
    #[new]
    fn new() -> Self {
        Self
    }

    #[getter]
    fn o_type(&self) -> u8 {
        QType::Null.as_u8()
    }

    #[getter]
    fn value(&self, py: Python<'_>) -> PyObject {
        py.None()
    }

    fn __bool__(&self) -> bool {
        false
    }

    fn __str__(&self) -> &'static str {
        "None"
    }

    fn __repr__(&self) -> &'static str {
        "None"
    }
}

#[pyclass(name = "QNum", module = "pyqemu")]
#[derive(Debug, Clone, Copy)]
pub struct PyQNum {
    value: QNum,
}

#[pymethods]
impl PyQNum {
    #[new]
    fn new(value: &Bound<'_, PyAny>) -> PyResult<Self> {
        Ok(Self {
            value: extract_num(value)?,
        })
    }

    #[getter]
    fn o_type(&self) -> u8 {
        QType::Num.as_u8()
    }

    #[getter]
    fn value(&self, py: Python<'_>) -> PyObject {
        num_to_py(py, self.value)
    }

    #[setter]
    fn set_value(&mut self, value: &Bound<'_, PyAny>) -> PyResult<()> {
        self.value = extract_num(value)?;
        Ok(())
    }

    fn __int__(&self) -> i128 {
        match self.value {
            QNum::I64(v) => i128::from(v),
            QNum::U64(v) => i128::from(v),
            QNum::Double(d) => d as i128,
        }
    }

    fn __float__(&self) -> f64 {
        self.value.to_f64()
    }

    fn __bool__(&self) -> bool {
        !self.value.is_zero()
    }

    fn __str__(&self) -> String {
        self.value.to_string()
    }

    fn __repr__(&self) -> String {
        self.value.to_string()
    }
}

#[pyclass(name = "QString", module = "pyqemu")]
#[derive(Debug, Clone)]
pub struct PyQString {
    value: String,
}

#[pymethods]
impl PyQString {
    #[new]
    fn new(value: String) -> Self {
        Self { value }
    }

    #[getter]
    fn o_type(&self) -> u8 {
        QType::String.as_u8()
    }

    #[getter]
    fn value(&self) -> &str {
        &self.value
    }

    #[setter]
    fn set_value(&mut self, value: String) {
        self.value = value;
    }

    fn __bool__(&self) -> bool {
        !self.value.is_empty()
    }

    fn __str__(&self) -> &str {
        &self.value
    }

    fn __repr__(&self) -> &str {
        &self.value
    }
}

#[pyclass(name = "QBool", module = "pyqemu")]
#[derive(Debug, Clone, Copy)]
pub struct PyQBool {
    value: bool,
}

#[pymethods]
impl PyQBool {
    #[new]
    fn new(value: bool) -> Self {
        Self { value }
    }

    #[getter]
    fn o_type(&self) -> u8 {
        QType::Bool.as_u8()
    }

    #[getter]
    fn value(&self) -> bool {
        self.value
    }

    #[setter]
    fn set_value(&mut self, value: bool) {
        self.value = value;
    }

    fn __bool__(&self) -> bool {
        self.value
    }

    fn __str__(&self) -> String {
        QObject::Bool(self.value).to_string()
    }

    fn __repr__(&self) -> String {
        QObject::Bool(self.value).to_string()
    }
}

// =============================================================================
// Containers
// =============================================================================

#[pyclass(name = "QDict", module = "pyqemu")]
#[derive(Debug, Default)]
pub struct PyQDict {
    value: IndexMap<String, PyObject>,
}

#[pymethods]
impl PyQDict {
    #[new]
    fn new() -> Self {
        Self::default()
    }

    #[getter]
    fn o_type(&self) -> u8 {
        QType::Dict.as_u8()
    }

    /// A plain dict view; entries are the stored objects, not copies.
    #[getter]
    fn value<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let out = PyDict::new_bound(py);
        for (k, v) in &self.value {
            out.set_item(k, v.clone_ref(py))?;
        }
        Ok(out)
    }

    fn qdict_put(&mut self, key: &Bound<'_, PyAny>, val: &Bound<'_, PyAny>) -> PyResult<()> {
        self.value.insert(key.str()?.to_string(), into_node(val)?);
        Ok(())
    }

    fn qdict_put_int(&mut self, key: &Bound<'_, PyAny>, num: &Bound<'_, PyAny>) -> PyResult<()> {
        let py = key.py();
        let node = Py::new(py, PyQNum::new(num)?)?.into_py(py);
        self.value.insert(key.str()?.to_string(), node);
        Ok(())
    }

    fn qdict_put_str(&mut self, key: &Bound<'_, PyAny>, string: String) -> PyResult<()> {
        let py = key.py();
        let node = Py::new(py, PyQString::new(string))?.into_py(py);
        self.value.insert(key.str()?.to_string(), node);
        Ok(())
    }

    fn qdict_put_null(&mut self, key: &Bound<'_, PyAny>) -> PyResult<()> {
        let py = key.py();
        let node = Py::new(py, PyQNull)?.into_py(py);
        self.value.insert(key.str()?.to_string(), node);
        Ok(())
    }

    fn qdict_put_bool(&mut self, key: &Bound<'_, PyAny>, b: bool) -> PyResult<()> {
        let py = key.py();
        let node = Py::new(py, PyQBool::new(b))?.into_py(py);
        self.value.insert(key.str()?.to_string(), node);
        Ok(())
    }

    fn __len__(&self) -> usize {
        self.value.len()
    }

    fn __bool__(&self) -> bool {
        !self.value.is_empty()
    }

    fn __getitem__(&self, py: Python<'_>, key: &str) -> PyResult<PyObject> {
        self.value
            .get(key)
            .map(|v| v.clone_ref(py))
            .ok_or_else(|| Error::key_not_found(key).into())
    }

    fn __setitem__(&mut self, key: &str, val: &Bound<'_, PyAny>) -> PyResult<()> {
        self.value.insert(key.to_string(), into_node(val)?);
        Ok(())
    }

    fn __contains__(&self, key: &str) -> bool {
        self.value.contains_key(key)
    }

    fn __iter__<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyIterator>> {
        let keys: Vec<&str> = self.value.keys().map(String::as_str).collect();
        PyList::new_bound(py, keys).as_any().iter()
    }

    fn __str__(slf: &Bound<'_, Self>) -> PyResult<String> {
        Ok(to_qobject(slf.as_any())?.to_string())
    }

    fn __repr__(slf: &Bound<'_, Self>) -> PyResult<String> {
        Self::__str__(slf)
    }

    fn __traverse__(&self, visit: PyVisit<'_>) -> Result<(), PyTraverseError> {
        for v in self.value.values() {
            visit.call(v)?;
        }
        Ok(())
    }

    fn __clear__(&mut self) {
        self.value.clear();
    }
}

#[pyclass(name = "QList", module = "pyqemu")]
#[derive(Debug, Default)]
pub struct PyQList {
    value: Vec<PyObject>,
}

impl PyQList {
    /// Python-style index: negative values count from the end.
    fn resolve(&self, index: isize) -> PyResult<usize> {
        let len = self.value.len();
        let resolved = if index < 0 {
            index.checked_add_unsigned(len)
        } else {
            Some(index)
        };
        resolved
            .and_then(|i| usize::try_from(i).ok())
            .filter(|&i| i < len)
            .ok_or_else(|| {
                PyIndexError::new_err(format!(
                    "index {index} out of range for list of length {len}"
                ))
            })
    }
}

#[pymethods]
impl PyQList {
    #[new]
    fn new() -> Self {
        Self::default()
    }

    #[getter]
    fn o_type(&self) -> u8 {
        QType::List.as_u8()
    }

    /// A plain list view; items are the stored objects, not copies.
    #[getter]
    fn value<'py>(&self, py: Python<'py>) -> Bound<'py, PyList> {
        PyList::new_bound(py, self.value.iter().map(|v| v.clone_ref(py)))
    }

    fn qlist_append(&mut self, val: &Bound<'_, PyAny>) -> PyResult<()> {
        self.value.push(into_node(val)?);
        Ok(())
    }

    fn qlist_append_bool(&mut self, py: Python<'_>, val: bool) -> PyResult<()> {
        self.value.push(Py::new(py, PyQBool::new(val))?.into_py(py));
        Ok(())
    }

    fn qlist_append_int(&mut self, val: &Bound<'_, PyAny>) -> PyResult<()> {
        let py = val.py();
        self.value.push(Py::new(py, PyQNum::new(val)?)?.into_py(py));
        Ok(())
    }

    fn qlist_append_null(&mut self, py: Python<'_>) -> PyResult<()> {
        self.value.push(Py::new(py, PyQNull)?.into_py(py));
        Ok(())
    }

    fn qlist_append_str(&mut self, py: Python<'_>, val: String) -> PyResult<()> {
        self.value.push(Py::new(py, PyQString::new(val))?.into_py(py));
        Ok(())
    }

    fn __len__(&self) -> usize {
        self.value.len()
    }

    fn __bool__(&self) -> bool {
        !self.value.is_empty()
    }

    fn __getitem__(&self, py: Python<'_>, index: isize) -> PyResult<PyObject> {
        Ok(self.value[self.resolve(index)?].clone_ref(py))
    }

    fn __setitem__(&mut self, index: isize, val: &Bound<'_, PyAny>) -> PyResult<()> {
        let index = self.resolve(index)?;
        self.value[index] = into_node(val)?;
        Ok(())
    }

    fn __iter__<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyIterator>> {
        self.value(py).as_any().iter()
    }

    fn __str__(slf: &Bound<'_, Self>) -> PyResult<String> {
        Ok(to_qobject(slf.as_any())?.to_string())
    }

    fn __repr__(slf: &Bound<'_, Self>) -> PyResult<String> {
        Self::__str__(slf)
    }

    fn __traverse__(&self, visit: PyVisit<'_>) -> Result<(), PyTraverseError> {
        for v in &self.value {
            visit.call(v)?;
        }
        Ok(())
    }

    fn __clear__(&mut self) {
        self.value.clear();
    }
}

// =============================================================================
// Job submission
// =============================================================================

/// Job queue entry point for scripts.
#[pyclass(name = "RapidAnalysis", module = "pyqemu")]
#[derive(Debug)]
pub struct PyRapidAnalysis;

#[pymethods]
impl PyRapidAnalysis {
    /// Submit `jobmsg` to `queue`. `bytes`/`bytearray` payloads are forwarded
    /// unchanged; anything else is encoded as a QObject message.
    #[staticmethod]
    #[pyo3(name = "addJob")]
    fn add_job(queue: &str, jobmsg: &Bound<'_, PyAny>) -> PyResult<()> {
        let queue = QueueName::from_string(queue)?;
        let client =
            JobClient::with_encoding(runtime::backend()?, runtime::config().plugin.job_encoding);

        if let Ok(raw) = jobmsg.downcast::<PyBytes>() {
            return Ok(client.add_raw_job(&queue, raw.as_bytes())?);
        }
        if let Ok(raw) = jobmsg.downcast::<PyByteArray>() {
            return Ok(client.add_raw_job(&queue, &raw.to_vec())?);
        }
        Ok(client.add_job(&queue, &to_qobject(jobmsg)?)?)
    }
}
